//! WhatsApp Cloud API webhook shapes.
//!
//! Every level is optional so that partial or unexpected payloads
//! deserialize and are then skipped instead of rejected.

use relay_core::InboundMessage;
use serde::Deserialize;
use serde_json::Value;

pub const WHATSAPP_OBJECT: &str = "whatsapp_business_account";

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode", alias = "mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token", alias = "verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge", alias = "challenge")]
    pub challenge: Option<String>,
}

impl VerifyQuery {
    /// The challenge to echo, if the subscription request is valid.
    pub fn accepted_challenge(self, expected_token: &str) -> Option<String> {
        let subscribed = self.mode.as_deref() == Some("subscribe");
        let token_matches = self.verify_token.as_deref() == Some(expected_token);
        if subscribed && token_matches {
            Some(self.challenge.unwrap_or_default())
        } else {
            None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookChange {
    pub value: Option<WebhookValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookValue {
    pub messages: Option<Vec<WebhookMessage>>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    pub from: Option<String>,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    pub text: Option<WebhookText>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookText {
    pub body: Option<String>,
}

pub fn payload_object(payload: &Value) -> Option<&str> {
    payload.get("object").and_then(|value| value.as_str())
}

/// Extracts `entry[0].changes[0].value.messages[0]` when it is a text
/// message. Later entries, changes and messages in the batch are ignored.
pub fn first_inbound_message(payload: Value) -> Option<InboundMessage> {
    let payload: WebhookPayload = serde_json::from_value(payload).ok()?;
    let message = payload
        .entry
        .into_iter()
        .next()?
        .changes
        .into_iter()
        .next()?
        .value?
        .messages?
        .into_iter()
        .next()?;

    if message
        .message_type
        .as_deref()
        .is_some_and(|kind| kind != "text")
    {
        return None;
    }

    let text = message.text?.body?;
    let sender_id = message.from?;

    Some(InboundMessage { sender_id, text })
}
