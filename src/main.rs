//! voicepack-manager - Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use voicepack_manager::packages::{CatalogClient, PackageRegistry};
use voicepack_manager::{ManagerConfig, api, metrics};

#[derive(Parser, Debug)]
#[command(name = "voicepack-manager")]
#[command(about = "Local voice pack registry and update manager", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override API port
    #[arg(long)]
    port: Option<u16>,

    /// Override voice pack install directory
    #[arg(long)]
    install_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (json or pretty)
    #[arg(long, default_value = "json")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    match cli.log_format.as_str() {
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(cli.log_level.as_str())
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(cli.log_level.as_str())
                .json()
                .init();
        }
    }

    tracing::info!("Starting voicepack-manager");

    // Load configuration
    let mut config = ManagerConfig::load(cli.config)?;

    // CLI overrides
    if let Some(port) = cli.port {
        config.api_port = port;
    }
    if let Some(install_dir) = cli.install_dir {
        config.install_dir = install_dir;
    }

    config.validate()?;

    tracing::info!(
        api_port = config.api_port,
        install_dir = ?config.install_dir,
        language = %config.language,
        catalog = %config.catalog_base_url,
        "Configuration loaded"
    );

    // Setup metrics
    let prometheus_handle = metrics::setup_metrics()?;

    // Initialize the registry; the initial scan runs here and the first
    // catalog update check is dispatched in the background
    let catalog = CatalogClient::new(
        config.catalog_base_url.clone(),
        Duration::from_secs(config.catalog_timeout_secs),
    )
    .map_err(|e| anyhow::anyhow!("Failed to build catalog client: {e}"))?;

    let registry = PackageRegistry::bootstrap(&config, catalog)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize package registry: {e}"))?;

    // Setup API
    let app_state = api::AppState {
        registry,
        prometheus_handle,
    };

    let app = api::create_router(app_state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.api_port));
    tracing::info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind API server")?;

    // Graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
