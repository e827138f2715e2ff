use anyhow::Result;
use clap::Parser;
use relay_api::{build_app, RelayConfig};
use relay_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("relay_api");

    let config = RelayConfig::parse();
    let app = build_app(&config).await?;

    let bind = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(
        bind = %bind,
        profile = %config.profile,
        timezone = %config.timezone,
        "shuttle relay started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
