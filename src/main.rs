// =============================================================================
// brokernomex API — Main Entry Point
// =============================================================================
//
// Boots logging, reads configuration from the environment, builds the shared
// application state, and serves the API until a shutdown signal arrives.
// Missing integration credentials degrade the affected endpoints instead of
// stopping startup, so the binary always comes up.
// =============================================================================

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use brokernomex_api::api;
use brokernomex_api::app_state::AppState;
use brokernomex_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config));

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "brokernomex API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("brokernomex API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl+C handler");
        return;
    }
    info!("shutdown signal received");
}
