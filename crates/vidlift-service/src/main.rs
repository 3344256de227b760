mod setup;
mod telemetry;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::telemetry::{init_telemetry, LogFormat};

/// Periodically capture recent footage from a video store and upload it.
#[derive(Debug, Parser)]
#[command(name = "vidlift", version)]
struct Cli {
    /// Path to the JSON configuration document
    #[arg(long, env = "VIDLIFT_CONFIG", default_value = "vidlift.json")]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let format = LogFormat::from_env_value(std::env::var("VIDLIFT_LOG_FORMAT").ok().as_deref());
    init_telemetry(format).map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    let config = setup::load_config(&cli.config)?;
    if cli.check {
        tracing::info!(config = %cli.config.display(), "Configuration is valid");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let scheduler = setup::initialize_service(&config, cancel)?;

    shutdown_signal().await;
    scheduler.shutdown().await;

    tracing::info!("vidlift stopped");
    Ok(())
}

/// Resolves on Ctrl+C (SIGINT) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
