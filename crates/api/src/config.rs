use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use clap::Parser;
use relay_agents::{GeminiSettings, WhatsAppSettings};
use relay_core::RelayProfile;

/// Process configuration, read once at startup from flags or the environment.
/// Missing credentials are accepted here; they only surface when a send or
/// assistant call is attempted.
#[derive(Debug, Clone, Parser)]
#[command(name = "relay-api")]
#[command(about = "WhatsApp shuttle relay webhook server")]
pub struct RelayConfig {
    #[arg(long, env = "VERIFY_TOKEN", default_value = "my_secure_custom_token_123")]
    pub verify_token: String,

    #[arg(long, env = "WHATSAPP_TOKEN", default_value = "")]
    pub whatsapp_token: String,

    #[arg(long, env = "PHONE_NUMBER_ID", default_value = "")]
    pub phone_number_id: String,

    #[arg(long, env = "GRAPH_API_BASE", default_value = "https://graph.facebook.com")]
    pub graph_api_base: String,

    #[arg(long, env = "GRAPH_API_VERSION", default_value = "v17.0")]
    pub graph_api_version: String,

    #[arg(long, env = "GEMINI_API_KEY", default_value = "")]
    pub gemini_api_key: String,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub gemini_model: String,

    #[arg(
        long,
        env = "GEMINI_API_BASE",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub gemini_api_base: String,

    /// `assistant` routes commands and falls back to Gemini; `echo` repeats
    /// every message back.
    #[arg(long, env = "RELAY_PROFILE", default_value = "assistant")]
    pub profile: RelayProfile,

    #[arg(long, env = "RELAY_TIMEZONE", default_value = "Africa/Cairo")]
    pub timezone: String,

    #[arg(long, env = "RELAY_HTTP_TIMEOUT_SECS", default_value_t = 20)]
    pub http_timeout_secs: u64,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
}

impl RelayConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| anyhow!("unknown timezone `{}`", self.timezone))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn whatsapp_settings(&self) -> WhatsAppSettings {
        WhatsAppSettings {
            api_base: self.graph_api_base.clone(),
            api_version: self.graph_api_version.clone(),
            phone_number_id: self.phone_number_id.clone(),
            access_token: self.whatsapp_token.clone(),
        }
    }

    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            api_base: self.gemini_api_base.clone(),
            model: self.gemini_model.clone(),
            api_key: self.gemini_api_key.clone(),
        }
    }
}
