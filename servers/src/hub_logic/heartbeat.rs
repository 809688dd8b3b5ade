use std::sync::Arc;
use std::time::Duration;

use hub_common::{hub_log, LogCategory, LoggerRegistry};
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(60);

/// Writes an uptime line to the access log every `period` until shutdown.
pub async fn run(registry: Arc<LoggerRegistry>, period: Duration, mut shutdown: broadcast::Receiver<()>) {
    let access = registry.get(LogCategory::Access);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut beats: u32 = 0;
    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {
                beats += 1;
                hub_log!(access, "alive, {:?} up", period * beats).await;
            }
        }
    }
    tracing::debug!(beats, "heartbeat stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_common::{LoggingConfig, Placement};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn beats_until_shutdown_and_drains_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            local_log_dir: dir.path().to_path_buf(),
            placement: Placement::Local,
            timestamp_format: String::new(),
            ..LoggingConfig::default()
        };
        let registry = Arc::new(LoggerRegistry::new(config).unwrap());
        let (shutdown_tx, _) = broadcast::channel(1);

        let worker = tokio::spawn(run(
            Arc::clone(&registry),
            Duration::from_millis(10),
            shutdown_tx.subscribe(),
        ));
        tokio::time::sleep(Duration::from_millis(120)).await;
        shutdown_tx.send(()).unwrap();
        worker.await.unwrap();

        let reports = registry.close_all().await;
        assert_eq!(reports.len(), 1);
        let contents = std::fs::read_to_string(&reports[0].path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert!(!lines.is_empty());
        assert_eq!(lines.len() as u64, reports[0].written);
        assert!(lines.iter().all(|line| line.contains("heartbeat::run: alive, ")), "{contents}");
        assert!(lines[0].ends_with("alive, 10ms up"), "{contents}");
    }
}
