use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::TimeZone;
use chrono_tz::Africa::Cairo;
use parking_lot::Mutex;
use relay_agents::{
    DeliveryOutcome, GenerationOutcome, GenerativeClient, MessageSender, RelayAgent, AI_APOLOGY,
};
use relay_api::{build_router, ApiState};
use relay_core::{FixedClock, HolidayTable, OutboundReply, RelayProfile, ScheduleTable};
use relay_observability::AppMetrics;
use serde_json::{json, Value};
use tower::ServiceExt;

const VERIFY_TOKEN: &str = "test-verify-token";

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<OutboundReply>>,
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, reply: &OutboundReply) -> DeliveryOutcome {
        self.sent.lock().push(reply.clone());
        DeliveryOutcome::Delivered
    }
}

struct CannedAssistant {
    outcome: GenerationOutcome,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl GenerativeClient for CannedAssistant {
    async fn generate(&self, prompt: &str) -> GenerationOutcome {
        self.prompts.lock().push(prompt.to_string());
        self.outcome.clone()
    }
}

struct Harness {
    app: Router,
    sender: Arc<RecordingSender>,
    assistant: Arc<CannedAssistant>,
    metrics: Arc<AppMetrics>,
}

impl Harness {
    fn new(profile: RelayProfile, outcome: GenerationOutcome) -> Self {
        // Friday: the weekend timetable applies.
        let now = Cairo.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();
        let sender = Arc::new(RecordingSender::default());
        let assistant = Arc::new(CannedAssistant {
            outcome,
            prompts: Mutex::new(Vec::new()),
        });
        let metrics = AppMetrics::shared();

        let agent = RelayAgent::new(
            profile,
            Arc::new(FixedClock::new(now)),
            Arc::new(ScheduleTable::builtin()),
            Arc::new(HolidayTable::builtin().expect("builtin holidays parse")),
            sender.clone(),
            assistant.clone(),
            metrics.clone(),
        );

        let app = build_router(ApiState {
            agent: Arc::new(agent),
            metrics: metrics.clone(),
            verify_token: Arc::from(VERIFY_TOKEN),
        });

        Self {
            app,
            sender,
            assistant,
            metrics,
        }
    }

    fn assistant_profile() -> Self {
        Self::new(
            RelayProfile::Assistant,
            GenerationOutcome::Generated("Paris is the capital of France.".to_string()),
        )
    }

    async fn wait_for_replies(&self, expected: usize) -> Vec<OutboundReply> {
        for _ in 0..200 {
            {
                let sent = self.sender.sent.lock();
                if sent.len() >= expected {
                    return sent.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sender.sent.lock().clone()
    }
}

fn delivery_request(payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn text_delivery(from: &str, body: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "102290129340398",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "messages": [{
                        "from": from,
                        "id": "wamid.HBgLMTY1MDM4Nzk0MzkVAgASGBQzQTRBNjU5OUFFRTAzODEwMTQ0RgA=",
                        "timestamp": "1760596200",
                        "type": "text",
                        "text": { "body": body }
                    }]
                }
            }]
        }]
    })
}

#[tokio::test]
async fn root_reports_liveness() {
    let harness = Harness::assistant_profile();

    let response = harness
        .app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Bot is running!");
}

#[tokio::test]
async fn verification_echoes_challenge_for_matching_token() {
    let harness = Harness::assistant_profile();

    let uri = format!(
        "/webhook?hub.mode=subscribe&hub.verify_token={}&hub.challenge=1158201444",
        VERIFY_TOKEN
    );
    let response = harness
        .app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"1158201444");
}

#[tokio::test]
async fn verification_with_wrong_token_is_forbidden() {
    let harness = Harness::assistant_profile();

    let response = harness
        .app
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1158201444")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(!String::from_utf8_lossy(&body).contains("1158201444"));
}

#[tokio::test]
async fn verification_without_parameters_is_forbidden() {
    let harness = Harness::assistant_profile();

    let response = harness
        .app
        .oneshot(Request::builder().uri("/webhook").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn shuttle_command_sends_weekend_schedule() {
    let harness = Harness::assistant_profile();

    let response = harness
        .app
        .clone()
        .oneshot(delivery_request(text_delivery("201000000010", "/shuttle now")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sent = harness.wait_for_replies(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient_id, "201000000010");
    assert!(sent[0].text.contains("Weekend / holiday"));
    assert!(sent[0].text.contains("Friday, 16 October 2026"));
    assert!(harness.assistant.prompts.lock().is_empty());
}

#[tokio::test]
async fn free_text_is_answered_by_assistant() {
    let harness = Harness::assistant_profile();

    let response = harness
        .app
        .clone()
        .oneshot(delivery_request(text_delivery(
            "201000000011",
            " What's the capital of France? ",
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sent = harness.wait_for_replies(1).await;
    assert_eq!(sent[0].text, "Paris is the capital of France.");
    assert_eq!(
        *harness.assistant.prompts.lock(),
        vec!["What's the capital of France?".to_string()]
    );
}

#[tokio::test]
async fn assistant_outage_replies_with_apology() {
    let harness = Harness::new(
        RelayProfile::Assistant,
        GenerationOutcome::Failed("Gemini non-success status 503".to_string()),
    );

    harness
        .app
        .clone()
        .oneshot(delivery_request(text_delivery("201000000012", "hello?")))
        .await
        .unwrap();

    let sent = harness.wait_for_replies(1).await;
    assert_eq!(sent[0].text, AI_APOLOGY);
}

#[tokio::test]
async fn echo_profile_repeats_message() {
    let harness = Harness::new(
        RelayProfile::Echo,
        GenerationOutcome::Generated("unused".to_string()),
    );

    harness
        .app
        .clone()
        .oneshot(delivery_request(text_delivery("201000000013", "/holidays")))
        .await
        .unwrap();

    let sent = harness.wait_for_replies(1).await;
    assert_eq!(sent[0].text, "You said: /holidays");
}

#[tokio::test]
async fn missing_messages_are_acknowledged_without_sending() {
    let harness = Harness::assistant_profile();

    let payload = json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "statuses": [{ "id": "wamid.1", "status": "delivered" }]
                }
            }]
        }]
    });

    let response = harness
        .app
        .clone()
        .oneshot(delivery_request(payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(harness.sender.sent.lock().is_empty());
    assert_eq!(harness.metrics.snapshot().ignored_deliveries_total, 1);
}

#[tokio::test]
async fn non_text_message_gets_no_reply() {
    let harness = Harness::assistant_profile();

    let payload = json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "changes": [{
                "value": {
                    "messages": [{
                        "from": "201000000014",
                        "type": "location",
                        "location": { "latitude": 30.04, "longitude": 31.23 }
                    }]
                }
            }]
        }]
    });

    let response = harness
        .app
        .clone()
        .oneshot(delivery_request(payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(harness.sender.sent.lock().is_empty());
}

#[tokio::test]
async fn unknown_object_is_not_found() {
    let harness = Harness::assistant_profile();

    let mut payload = text_delivery("201000000015", "/shuttle");
    payload["object"] = json!("page");

    let response = harness
        .app
        .clone()
        .oneshot(delivery_request(payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(harness.sender.sent.lock().is_empty());
}

#[tokio::test]
async fn health_reports_profile_and_counters() {
    let harness = Harness::assistant_profile();

    harness
        .app
        .clone()
        .oneshot(delivery_request(text_delivery("201000000016", "/holidays")))
        .await
        .unwrap();
    harness.wait_for_replies(1).await;

    let response = harness
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["profile"], "assistant");
    assert_eq!(parsed["metrics"]["webhook_deliveries_total"], 1);
}

#[tokio::test]
async fn verification_with_undecodable_query_is_forbidden() {
    let harness = Harness::assistant_profile();

    // `mode` duplicates `hub.mode`, so the query cannot be decoded.
    let uri = format!(
        "/webhook?hub.mode=subscribe&hub.verify_token={}&hub.challenge=42&mode=subscribe",
        VERIFY_TOKEN
    );
    let response = harness
        .app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(!String::from_utf8_lossy(&body).contains("42"));
}

#[tokio::test]
async fn delivery_without_json_content_type_is_still_read() {
    let harness = Harness::assistant_profile();

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .body(Body::from(
            text_delivery("201000000017", "/shuttle").to_string(),
        ))
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sent = harness.wait_for_replies(1).await;
    assert_eq!(sent[0].recipient_id, "201000000017");
}

#[tokio::test]
async fn non_json_delivery_is_not_found() {
    let harness = Harness::assistant_profile();

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(harness.metrics.snapshot().webhook_deliveries_total, 0);
}
