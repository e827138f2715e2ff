pub mod assistant;
pub mod outbound;

use std::sync::Arc;

use relay_core::{
    render_holidays, render_schedule, route, Clock, HolidayTable, InboundMessage, Intent,
    OutboundReply, RelayProfile, ScheduleTable,
};
use relay_observability::AppMetrics;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

pub use assistant::{GeminiClient, GeminiSettings, GenerationOutcome, GenerativeClient};
pub use outbound::{DeliveryOutcome, MessageSender, WhatsAppSender, WhatsAppSettings};

pub const AI_APOLOGY: &str =
    "Sorry, I couldn't process that request right now. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// `None` for the echo profile and for skipped messages.
    pub intent: Option<Intent>,
    pub outcome: DeliveryOutcome,
}

#[derive(Clone)]
pub struct RelayAgent {
    profile: RelayProfile,
    clock: Arc<dyn Clock>,
    schedule: Arc<ScheduleTable>,
    holidays: Arc<HolidayTable>,
    sender: Arc<dyn MessageSender>,
    assistant: Arc<dyn GenerativeClient>,
    metrics: Arc<AppMetrics>,
}

impl RelayAgent {
    pub fn new(
        profile: RelayProfile,
        clock: Arc<dyn Clock>,
        schedule: Arc<ScheduleTable>,
        holidays: Arc<HolidayTable>,
        sender: Arc<dyn MessageSender>,
        assistant: Arc<dyn GenerativeClient>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            profile,
            clock,
            schedule,
            holidays,
            sender,
            assistant,
            metrics,
        }
    }

    pub fn profile(&self) -> RelayProfile {
        self.profile
    }

    /// Composes and sends the reply for one inbound message. Delivery
    /// failures are logged and reported, never raised.
    #[instrument(
        skip(self, message),
        fields(dispatch_id = %Uuid::new_v4(), sender = %message.sender_id, profile = %self.profile)
    )]
    pub async fn handle(&self, message: InboundMessage) -> DispatchReport {
        if message.text.trim().is_empty() {
            debug!("empty message body, nothing to reply");
            return DispatchReport {
                intent: None,
                outcome: DeliveryOutcome::Skipped,
            };
        }

        let (intent, text) = self.compose_reply(&message).await;
        let reply = OutboundReply {
            recipient_id: message.sender_id,
            text,
        };

        let outcome = self.sender.send(&reply).await;
        match &outcome {
            DeliveryOutcome::Delivered => {
                self.metrics.inc_reply_delivered();
                info!(
                    intent = intent.as_ref().map(Intent::as_code).unwrap_or("echo"),
                    reply_chars = reply.text.chars().count(),
                    "reply delivered"
                );
            }
            DeliveryOutcome::Failed(reason) => {
                self.metrics.inc_send_failure();
                error!(reason = %reason, "failed to deliver reply");
            }
            DeliveryOutcome::Skipped => debug!("sender skipped reply"),
        }

        DispatchReport { intent, outcome }
    }

    pub async fn compose_reply(&self, message: &InboundMessage) -> (Option<Intent>, String) {
        if self.profile == RelayProfile::Echo {
            return (None, format!("You said: {}", message.text));
        }

        let intent = route(message);
        let text = match &intent {
            Intent::Shuttle => render_schedule(&self.clock.now(), &self.holidays, &self.schedule),
            Intent::Holidays => render_holidays(&self.clock.now(), &self.holidays),
            Intent::Assistant { prompt } => self.ask_assistant(prompt).await,
        };

        (Some(intent), text)
    }

    async fn ask_assistant(&self, prompt: &str) -> String {
        self.metrics.inc_assistant_request();
        match self.assistant.generate(prompt).await {
            GenerationOutcome::Generated(text) => text,
            GenerationOutcome::Failed(reason) => {
                self.metrics.inc_assistant_failure();
                warn!(reason = %reason, "assistant unavailable, replying with apology");
                AI_APOLOGY.to_string()
            }
        }
    }
}
