use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const API_KEY_HEADER: &str = "x-goog-api-key";

pub const ASSISTANT_PREAMBLE: &str = "You are a friendly assistant in a campus shuttle \
community chat on WhatsApp. Reply in plain text, briefly and clearly. If the question is \
about shuttle times or holidays, suggest the /shuttle or /holidays commands.\n\nUser message: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated(String),
    Failed(String),
}

#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> GenerationOutcome;
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_base: String,
    pub model: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(client: Client, settings: GeminiSettings) -> Self {
        Self { client, settings }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.model
        )
    }

    async fn request_text(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "contents": [
                {
                    "parts": [
                        { "text": format!("{ASSISTANT_PREAMBLE}{prompt}") }
                    ]
                }
            ]
        });

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.settings.api_key.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini non-success status {}: {}", status.as_u16(), body);
        }

        let body: Value = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Gemini parse failed")?;
        extract_candidate_text(&body)
            .filter(|text| !text.trim().is_empty())
            .context("Gemini candidate text missing")
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> GenerationOutcome {
        match self.request_text(prompt).await {
            Ok(text) => GenerationOutcome::Generated(text),
            Err(err) => GenerationOutcome::Failed(format!("{err:#}")),
        }
    }
}

fn extract_candidate_text(payload: &Value) -> Option<String> {
    payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|value| value.as_str())
        .map(|text| text.trim().to_string())
}
