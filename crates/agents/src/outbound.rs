use anyhow::{Context, Result};
use async_trait::async_trait;
use relay_core::OutboundReply;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

/// WhatsApp rejects text bodies longer than this many characters.
pub const MAX_TEXT_BODY_CHARS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Skipped,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Delivers a reply to the messaging platform. Implementations report
/// failures through [`DeliveryOutcome`] instead of erroring; callers log and
/// move on.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, reply: &OutboundReply) -> DeliveryOutcome;
}

#[derive(Debug, Clone)]
pub struct WhatsAppSettings {
    pub api_base: String,
    pub api_version: String,
    pub phone_number_id: String,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    text: SendMessageText<'a>,
}

#[derive(Debug, Serialize)]
struct SendMessageText<'a> {
    body: &'a str,
}

#[derive(Debug, Clone)]
pub struct WhatsAppSender {
    client: Client,
    settings: WhatsAppSettings,
}

impl WhatsAppSender {
    pub fn new(client: Client, settings: WhatsAppSettings) -> Self {
        Self { client, settings }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.api_version,
            self.settings.phone_number_id
        )
    }

    async fn post_text(&self, to: &str, body: &str) -> Result<()> {
        let payload = SendMessageRequest {
            messaging_product: "whatsapp",
            to,
            text: SendMessageText { body },
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.settings.access_token.as_str())
            .json(&payload)
            .send()
            .await
            .context("WhatsApp send request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("WhatsApp non-success status {}: {}", status.as_u16(), body);
        }

        Ok(())
    }
}

#[async_trait]
impl MessageSender for WhatsAppSender {
    async fn send(&self, reply: &OutboundReply) -> DeliveryOutcome {
        let chunks = split_text_body(&reply.text, MAX_TEXT_BODY_CHARS);
        let total = chunks.len();

        for (index, chunk) in chunks.iter().enumerate() {
            if let Err(err) = self.post_text(&reply.recipient_id, chunk).await {
                return DeliveryOutcome::Failed(format!("{err:#}"));
            }
            debug!(chunk = index + 1, total, "whatsapp chunk sent");
        }

        DeliveryOutcome::Delivered
    }
}

/// Splits on character boundaries into pieces of at most `max_chars`.
pub fn split_text_body(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    text.chars()
        .collect::<Vec<_>>()
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
