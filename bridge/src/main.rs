mod model;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use config_manager::BridgeConfig;
use onvif_server::{onvif_router, OnvifServerState};
use onvif_sources::{
    register_onvif, sources_router, NetworkBackend, OnvifBackend, SchemeRegistry, SourcesState,
};
use tracing_subscriber::EnvFilter;

/// ONVIF Bridge
///
/// - Presents every configured stream as a profile of one virtual ONVIF camera
/// - Discovers ONVIF cameras on the LAN and lists their streams
/// - Resolves `onvif://` sources to the camera's own RTSP URI
#[derive(Parser)]
#[command(name = "onvif-bridge")]
#[command(about = "Virtual ONVIF camera and ONVIF source bridge")]
struct Cli {
    /// Config file (default: <config dir>/onvif-bridge/bridge.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP listen address, overrides the config file
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => BridgeConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BridgeConfig::load().context("Failed to load config")?,
    };

    let listen = match cli.listen {
        Some(addr) => addr,
        None => config.listen_addr()?,
    };

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(config, listen))
}

async fn async_main(config: BridgeConfig, listen: SocketAddr) -> Result<()> {
    let model = Arc::new(model::device_model(&config, env!("CARGO_PKG_VERSION")));
    tracing::info!(
        "Virtual ONVIF device '{}' with {} profile(s), RTSP port {}",
        model.device.name,
        model.streams.len(),
        model.rtsp_port
    );

    let backend: Arc<dyn OnvifBackend> = Arc::new(NetworkBackend::default());
    let mut registry = SchemeRegistry::new();
    registry.register_direct_schemes();
    register_onvif(&mut registry, Arc::clone(&backend));
    tracing::debug!("Stream registry schemes: {:?}", registry.schemes());

    let app = onvif_router(Arc::new(OnvifServerState::new(model))).merge(sources_router(
        Arc::new(SourcesState::new(backend, Arc::new(registry))),
    ));

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    tracing::info!("ONVIF bridge listening on http://{}", listen);

    axum::serve(listener, app).await?;

    Ok(())
}
