//! Explorer session host.
//!
//! Loads the remote capabilities once, then serves interactive explorer
//! sessions over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use explorer::{ExplorerConfig, ReactiveController};
use explorer_api::{router, state::AppState};
use wms_protocol::{HttpWmsClient, WmsService};

#[derive(Parser, Debug)]
#[command(name = "explorer-api")]
#[command(about = "Interactive WMS layer explorer sessions over HTTP")]
struct Args {
    /// Listen address
    #[arg(short, long, env = "EXPLORER_LISTEN", default_value = "0.0.0.0:8090")]
    listen: String,

    /// YAML configuration file
    #[arg(short, long, env = "EXPLORER_CONFIG")]
    config: Option<PathBuf>,

    /// WMS endpoint (overrides the config file)
    #[arg(long, env = "WMS_BASE_URL")]
    base_url: Option<String>,

    /// Seconds a session may go unused before it is dropped
    #[arg(long, env = "EXPLORER_SESSION_IDLE_SECS", default_value_t = 1800)]
    session_idle_secs: u64,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let mut config = match &args.config {
        Some(path) => ExplorerConfig::from_file(path)?,
        None => ExplorerConfig::default(),
    };
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    config.validate().context("Invalid explorer configuration")?;

    info!(base_url = %config.base_url, version = config.version.as_str(), "Starting explorer API");

    let client: Arc<dyn WmsService> = Arc::new(
        HttpWmsClient::new(&config.base_url, config.version, config.request_timeout())
            .context("Failed to create WMS client")?,
    );
    let capabilities = client
        .get_capabilities()
        .await
        .with_context(|| format!("Failed to load capabilities from {}", config.base_url))?;
    info!(layers = capabilities.len(), "Capabilities loaded");

    let controller = Arc::new(ReactiveController::new(
        Arc::new(capabilities),
        client,
        Arc::new(config),
    ));
    info!(products = controller.catalog().products().len(), "Catalog built");

    let state = Arc::new(AppState::new(
        controller,
        Duration::from_secs(args.session_idle_secs),
    ));
    state.spawn_idle_sweeper();
    info!(idle_secs = args.session_idle_secs, "Session idle sweeper started");

    let app = router(state, prometheus_handle);

    let addr: SocketAddr = args.listen.parse().context("Invalid listen address")?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
