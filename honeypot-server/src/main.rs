// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Honeypot — decoy page on every route, visitor IP log
//
//  Runtime:  current-thread tokio, axum
//  Store:    append-only JSON lines (one visit per line)
//  Config:   defaults < YAML file < HONEYPOT_* env < PORT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use clap::Parser;
use honeypot_core::HoneypotConfig;
use honeypot_http::AppState;
use honeypot_store::{FileStore, VisitStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "honeypot", version, about = "Decoy web endpoint that records visitor IPs")]
struct Cli {
    /// Path to an optional YAML configuration file
    #[arg(short, long, default_value = "honeypot.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Listening port (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Honeypot starting");

    // ── Config ──
    let mut config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        HoneypotConfig::load(Some(&cli.config))?
    } else {
        info!("No config file found, using defaults and environment");
        HoneypotConfig::load(None)?
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // ── Store + state (decoy page unreadable = fatal here) ──
    let store: Arc<dyn VisitStore> = Arc::new(FileStore::new(&config.capture.log_file));
    let state = Arc::new(AppState::from_config(&config, store)?);

    // ── Single-threaded cooperative runtime ──
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(honeypot_http::start(&config, state, shutdown_signal()))?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM (docker stop).
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
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping...");
}
