//! Campmeter Server
//!
//! Run with: cargo run --bin campmeter-api
//!
//! # Configuration
//!
//! Config file: `--config <path>`, else `~/.config/campmeter/config.toml`,
//! `/etc/campmeter/config.toml` or `./config.toml`.
//!
//! Environment variables (override the file):
//! - `CAMPMETER_STORE_URL`: NocoDB data API base URL
//! - `CAMPMETER_STORE_TOKEN`: API token sent as `xc-token` (required)
//! - `CAMPMETER_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `CAMPMETER_API_PORT`: Port to listen on (default: 8085)
//! - `CAMPMETER_LOG_LEVEL`: Log level (default: info)
//! - `CAMPMETER_LOG_FORMAT`: `pretty` or `json`
//! - `RUST_LOG`: Full filter, wins over the level above

use anyhow::Context;
use campmeter::api::{serve, AppState};
use campmeter::config::Config;
use campmeter::dashboard::Dashboard;
use campmeter::store::NocoClient;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "campmeter-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Camping utility-meter dashboard server")]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::resolve_logged(args.config.as_deref())?;
    config.logging.init();
    config.validate()?;

    tracing::info!("Starting Campmeter server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Remote store: {}", config.store.base_url);

    let store = NocoClient::new(config.store.client_config())
        .context("failed to build remote store client")?;
    let dashboard = Arc::new(Dashboard::new(Arc::new(store)));

    // Serve even when the first load is partial; failures show as notices
    let report = dashboard.load().await;
    if !report.is_complete() {
        tracing::warn!("Initial load incomplete, serving with partial data");
    }

    let refresher = match config.dashboard.refresh_interval_secs {
        0 => None,
        secs => Some(Arc::clone(&dashboard).start_background_refresh(Duration::from_secs(secs))),
    };

    serve(AppState::new(Arc::clone(&dashboard)), &config.api).await?;

    dashboard.close();
    if let Some(handle) = refresher {
        handle.abort();
    }
    tracing::info!("Campmeter server stopped");

    Ok(())
}
