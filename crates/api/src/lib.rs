pub mod config;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use relay_agents::{GeminiClient, RelayAgent, WhatsAppSender};
use relay_core::{HolidayTable, RelayProfile, ScheduleTable, SystemClock};
use relay_observability::{AppMetrics, MetricsSnapshot};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

pub use crate::config::RelayConfig;
use crate::webhook::{first_inbound_message, payload_object, VerifyQuery, WHATSAPP_OBJECT};

const MAX_WEBHOOK_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<RelayAgent>,
    pub metrics: Arc<AppMetrics>,
    pub verify_token: Arc<str>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    profile: RelayProfile,
    metrics: MetricsSnapshot,
}

/// Wires the production collaborators from `config` and returns the router.
pub async fn build_app(config: &RelayConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();
    let timezone = config.timezone()?;
    let holidays = HolidayTable::builtin().context("bundled holiday table is invalid")?;

    let http_client = Client::builder()
        .connect_timeout(Duration::from_secs(6))
        .timeout(config.http_timeout())
        .build()
        .context("failed to build HTTP client")?;

    let agent = RelayAgent::new(
        config.profile,
        Arc::new(SystemClock::new(timezone)),
        Arc::new(ScheduleTable::builtin()),
        Arc::new(holidays),
        Arc::new(WhatsAppSender::new(
            http_client.clone(),
            config.whatsapp_settings(),
        )),
        Arc::new(GeminiClient::new(http_client, config.gemini_settings())),
        metrics.clone(),
    );

    let state = ApiState {
        agent: Arc::new(agent),
        metrics,
        verify_token: Arc::from(config.verify_token.as_str()),
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/webhook", get(webhook_verify).post(webhook_receive))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_WEBHOOK_BODY_BYTES))
        .with_state(state)
}

async fn root() -> &'static str {
    "Bot is running!"
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        profile: state.agent.profile(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

/// A query string that does not deserialize is treated like a wrong token.
async fn webhook_verify(
    State(state): State<ApiState>,
    query: Option<Query<VerifyQuery>>,
) -> Result<String, StatusCode> {
    let challenge = query.and_then(|Query(query)| query.accepted_challenge(&state.verify_token));
    match challenge {
        Some(challenge) => {
            info!("webhook verified");
            Ok(challenge)
        }
        None => {
            warn!("webhook verification rejected");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

/// Acknowledges the delivery right away; the reply is composed and sent on a
/// spawned task whose outcome never reaches the platform. A body that is not
/// JSON carries no `object` and is answered like an unknown one.
async fn webhook_receive(State(state): State<ApiState>, body: Bytes) -> StatusCode {
    let payload = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    if payload_object(&payload) != Some(WHATSAPP_OBJECT) {
        debug!(object = ?payload_object(&payload), "delivery for unknown object");
        return StatusCode::NOT_FOUND;
    }

    state.metrics.inc_webhook_delivery();

    let Some(message) = first_inbound_message(payload) else {
        state.metrics.inc_ignored_delivery();
        debug!("delivery carried no text message");
        return StatusCode::OK;
    };

    info!(sender = %message.sender_id, chars = message.text.chars().count(), "message received");

    let agent = state.agent.clone();
    tokio::spawn(async move {
        agent.handle(message).await;
    });

    StatusCode::OK
}
