use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use clap_serde_derive::ClapSerde;
use tokio::net::TcpListener;
use tracing::{error, info};

use speech_translate::config::{Config, DEFAULT_CONFIG_FILE};
use speech_translate::telemetry::init_telemetry;
use speech_translate::{create_router, AppState};

#[cfg(unix)]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env, default_value = DEFAULT_CONFIG_FILE)]
    config_file: String,

    /// Configuration options
    #[command(flatten)]
    pub opt_config: <Config as ClapSerde>::Opt,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config_file, args.opt_config)?;
    init_telemetry(config.otlp_endpoint(), config.console)?;

    let state = AppState::from_config(&config)?;
    info!(
        primary = state.orchestrator.tiers().primary().len(),
        secondary = state.orchestrator.tiers().secondary().len(),
        early_stop = ?config.early_stop,
        probe_window = config.probe_window,
        "Language detection configured"
    );
    let router = create_router(state);

    if let Some((cert, key)) = config.tls_files() {
        let addr: SocketAddr = format!("{}:{}", config.address, config.port)
            .parse()
            .context("Invalid listen address")?;
        let tls = RustlsConfig::from_pem_file(cert, key)
            .await
            .context("Failed to load TLS certificate")?;
        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        info!("Listening on {} (TLS)", addr);
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(router.into_make_service())
            .await?;
        return Ok(());
    }

    let listener = TcpListener::bind(format!("{}:{}", config.address, config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
