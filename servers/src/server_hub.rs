use std::sync::Arc;

use anyhow::Result;
use hub_common::protocol::ALL_COMMANDS;
use hub_common::{hub_log, LogCategory, LoggerRegistry};
use tokio::signal;

mod hub_logic;
use hub_logic::{config, heartbeat, logger};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = config::load_config()?;
    logger::setup_tracing(config.log_level())?;

    let logging = config.logging()?;
    let registry = Arc::new(LoggerRegistry::new(logging)?);
    tracing::debug!("{}", registry.config());

    let access = registry.get(LogCategory::Access);
    hub_log!(access, "DMRHub starting, version {}", env!("CARGO_PKG_VERSION")).await;
    hub_log!(access, "log files: {}", access.path().display()).await;
    tracing::debug!(commands = ?ALL_COMMANDS, "protocol commands recognised");

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

    let heartbeat_handle = tokio::spawn(heartbeat::run(
        Arc::clone(&registry),
        heartbeat::HEARTBEAT_PERIOD,
        shutdown_tx.subscribe(),
    ));

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = terminate() => {
            tracing::info!("SIGTERM received, initiating shutdown.");
        }
    }

    let _ = shutdown_tx.send(());
    if let Err(err) = heartbeat_handle.await {
        hub_log!(registry.get(LogCategory::Error), "heartbeat task failed: {}", err).await;
    }

    hub_log!(access, "DMRHub stopping").await;
    drop(access);

    for report in registry.close_all().await {
        tracing::info!(
            category = %report.category,
            path = %report.path.display(),
            written = report.written,
            failed = report.failed,
            "log relay closed"
        );
    }

    tracing::info!("Shutdown complete.");
    Ok(())
}

async fn terminate() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term_signal) => {
                term_signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}
