//! memos-import - local import service for Memos
//!
//! Serves the upload/job/SSE API on 127.0.0.1:3131 by default and, when a web
//! root is configured, the static UI.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memos_common::config::resolve_config_path;
use memos_import::client::MemosClientFactory;
use memos_import::config::CliOverrides;
use memos_import::{AppState, ServiceConfig};

const CONFIG_ENV: &str = "MEMOS_IMPORT_CONFIG";

/// Command-line arguments for memos-import
#[derive(Parser, Debug)]
#[command(name = "memos-import")]
#[command(about = "Import Flomo and WeChat Reading exports into Memos")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "MEMOS_IMPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "MEMOS_IMPORT_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "MEMOS_IMPORT_PORT")]
    port: Option<u16>,

    /// Directory for staged uploads
    #[arg(long, env = "MEMOS_IMPORT_UPLOAD_ROOT")]
    upload_root: Option<PathBuf>,

    /// Directory for sendedIds.json / memo.json
    #[arg(long, env = "MEMOS_ARTIFACT_DIR")]
    artifact_dir: Option<PathBuf>,

    /// Static UI directory
    #[arg(long, env = "MEMOS_IMPORT_WEB_ROOT")]
    web_root: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            host: self.host.clone(),
            port: self.port,
            upload_root: self.upload_root.clone(),
            artifact_dir: self.artifact_dir.clone(),
            web_root: self.web_root.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV, "memos-import");
    let config = ServiceConfig::load(args.overrides(), config_path.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let default_filter = config
        .logging
        .filter_directives(&["memos_import", "memos_common", "tower_http"]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting memos-import v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using defaults"),
    }
    info!("Upload root: {}", config.upload_root.display());
    info!("Artifact dir: {}", config.artifact_dir.display());

    let clients = Arc::new(MemosClientFactory::new(config.send_delay()));
    let sweep_interval = config.sweep_interval();
    let bind_addr = config.bind_addr();

    let state = AppState::new(config, clients).context("Failed to prepare upload root")?;
    state.staging.purge_stale_dirs().await;

    let shutdown = state.shutdown.clone();
    let sweeper = Arc::clone(&state.staging).spawn_sweeper(sweep_interval, shutdown.clone());

    let app = memos_import::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    if let Err(e) = sweeper.await {
        error!("Upload sweeper task failed: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then cancel background work
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }

    shutdown.cancel();
}
