//! # custody-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the custody stack.
//! Configuration comes from `CUSTODY_*` environment variables.

use custody_api::config::LogFormat;
use custody_api::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Initialize structured tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }

    let bind = config.bind;
    let state = AppState::build(config)
        .map_err(|e| {
            tracing::error!("Bootstrap failed: {e}");
            e
        })?
        .with_metrics(custody_api::middleware::metrics::install_recorder());

    let loaded = state.start().await.map_err(|e| {
        tracing::error!("Feed load failed: {e}");
        e
    })?;
    tracing::info!(records = loaded, head = state.ledger.head(), "feed loaded");

    let app = custody_api::app(state);

    tracing::info!("Custody API listening on {}", bind);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
