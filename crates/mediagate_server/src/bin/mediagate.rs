//! Mediagate - Matrix media scanning gateway.
//!
//! Fetches media from a homeserver, decrypts it when asked to, runs it past
//! an external scanner and only serves what the scanner calls clean.

use clap::Parser;
use mediagate_report::ReportService;
use mediagate_server::{AppState, MediagateConfig, create_router};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the gateway.
#[derive(Parser, Debug)]
#[command(name = "mediagate")]
#[command(about = "Mediagate - Matrix media scanning gateway")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mediagate.toml", env = "MEDIAGATE_CONFIG")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Mediagate");
    info!(config_file = ?args.config, "Loading configuration");
    let config = MediagateConfig::from_file(&args.config)?;
    info!(
        base_url = %config.scan.base_url(),
        temp_directory = %config.scan.temp_directory().display(),
        script = %config.scan.script(),
        "Configuration loaded"
    );

    let service = Arc::new(ReportService::new(config.scan.clone()));
    let app = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(config.server.address()).await?;
    info!(address = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Mediagate stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
    }
}
