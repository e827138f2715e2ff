use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    webhook_deliveries_total: AtomicU64,
    ignored_deliveries_total: AtomicU64,
    replies_delivered_total: AtomicU64,
    send_failures_total: AtomicU64,
    assistant_requests_total: AtomicU64,
    assistant_failures_total: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub webhook_deliveries_total: u64,
    pub ignored_deliveries_total: u64,
    pub replies_delivered_total: u64,
    pub send_failures_total: u64,
    pub assistant_requests_total: u64,
    pub assistant_failures_total: u64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_webhook_delivery(&self) {
        self.webhook_deliveries_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_webhook_deliveries_total").increment(1);
    }

    /// A delivery that carried no processable text message.
    pub fn inc_ignored_delivery(&self) {
        self.ignored_deliveries_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_ignored_deliveries_total").increment(1);
    }

    pub fn inc_reply_delivered(&self) {
        self.replies_delivered_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_replies_delivered_total").increment(1);
    }

    pub fn inc_send_failure(&self) {
        self.send_failures_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_send_failures_total").increment(1);
    }

    pub fn inc_assistant_request(&self) {
        self.assistant_requests_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_assistant_requests_total").increment(1);
    }

    pub fn inc_assistant_failure(&self) {
        self.assistant_failures_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_assistant_failures_total").increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            webhook_deliveries_total: self.webhook_deliveries_total.load(Ordering::Relaxed),
            ignored_deliveries_total: self.ignored_deliveries_total.load(Ordering::Relaxed),
            replies_delivered_total: self.replies_delivered_total.load(Ordering::Relaxed),
            send_failures_total: self.send_failures_total.load(Ordering::Relaxed),
            assistant_requests_total: self.assistant_requests_total.load(Ordering::Relaxed),
            assistant_failures_total: self.assistant_failures_total.load(Ordering::Relaxed),
        }
    }
}

/// Output shape of log lines, picked with `RELAY_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// Anything other than `text`/`pretty` keeps JSON lines.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
            Some("text") | Some("pretty") => Self::Text,
            _ => Self::Json,
        }
    }
}

/// Directives used when `RUST_LOG` is unset or unparsable.
pub fn default_directives(service_name: &str) -> String {
    ["relay_core", "relay_agents", "relay_api", "tower_http"]
        .iter()
        .filter(|target| **target != service_name)
        .fold(format!("warn,{service_name}=info"), |mut acc, target| {
            acc.push(',');
            acc.push_str(target);
            acc.push_str("=info");
            acc
        })
}

/// Installs the process-wide subscriber once; later calls are no-ops. Lines go
/// to stderr so CLI output on stdout stays clean.
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name)));
        let format = LogFormat::from_setting(std::env::var("RELAY_LOG_FORMAT").ok().as_deref());

        let builder = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter);

        // Another subscriber may already be installed (test harnesses).
        let _ = match format {
            LogFormat::Json => builder.json().with_current_span(true).try_init(),
            LogFormat::Text => builder.compact().try_init(),
        };
    });
}
