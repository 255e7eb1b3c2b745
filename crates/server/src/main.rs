//! maintenance-exporter: exposes configured maintenance windows as a
//! Prometheus gauge.
//!
//! Each window is a cron expression plus a duration. While a window is open
//! `maintenance_active{name="..."}` reads `1`, otherwise `0`.
//!
//! # Usage
//!
//! ```bash
//! # Search /etc/maintenance-exporter, ~/.maintenance-exporter and . for config.yaml
//! maintenance-exporter
//!
//! # Explicit config file
//! maintenance-exporter --config ./config.yaml
//!
//! # Via environment variables
//! MAINTENANCE_EXPORTER_CONFIG=/srv/windows.yaml MAINTENANCE_EXPORTER_ADDR=:9100 maintenance-exporter
//! ```

mod config;
mod http;
mod logging;
mod watcher;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use maintenance_core::{CoreConfig, Scheduler, SignalExporter, WindowRegistry};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::Config;

const SEPARATOR: &str = "----------------------------------------";

/// Exposes cron-driven maintenance windows as Prometheus metrics.
#[derive(Parser, Debug)]
#[command(name = "maintenance-exporter", version, about)]
struct Cli {
    /// Config file path. Searched for when omitted.
    #[arg(long, short, env = "MAINTENANCE_EXPORTER_CONFIG")]
    config: Option<PathBuf>,

    /// Do not watch the config file for changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let path = config::discover(cli.config.as_deref())?;
    let config = Config::from_file(&path)?;

    logging::init(config.config.logformat);
    info!("maintenance-exporter {}", env!("CARGO_PKG_VERSION"));
    info!(path = %path.display(), "using config file");

    let core = CoreConfig::from_timezone_name(&config.config.timezone)
        .context("invalid process timezone")?;

    let mut scheduler = Scheduler::new();
    let exporter = SignalExporter::new();
    let registry = WindowRegistry::load(&config.windows, &core, &mut scheduler, &exporter)
        .context("failed to load maintenance windows")?;
    if registry.is_empty() {
        warn!("no maintenance windows loaded");
    }

    let addr = config.config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let _watcher = if cli.no_watch {
        None
    } else {
        match watcher::watch_config(&path) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!(error = %e, "config file watching disabled");
                None
            }
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    info!("Starting the scheduler...");
    let clock = scheduler.start(shutdown_rx.clone())?;

    let report = registry
        .next_run_report(&core)
        .context("failed to determine next runs")?;
    info!("{SEPARATOR}");
    for line in &report {
        info!("{line}");
    }
    info!("{SEPARATOR}");

    // Install signal handlers for graceful shutdown.
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    info!("Start serving metrics on {}/metrics", config.config.addr);
    info!("Start serving readiness on {}/readiness", config.config.addr);
    info!("Start serving liveness on {}/liveness", config.config.addr);

    http::serve(listener, http::router(exporter.handle()), shutdown_rx)
        .await
        .context("HTTP server failed")?;

    if let Err(e) = clock.await {
        error!(error = %e, "scheduler clock terminated abnormally");
    }

    info!("maintenance-exporter exited cleanly");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                error!(error = %e, "failed to register SIGTERM handler");
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}
