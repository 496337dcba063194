use tokio::sync::watch;
use tokio::time::{Duration, sleep};

use crate::utils::url_locks::UrlLocks;

/// Periodic maintenance: prunes idle per-URL lock entries so the lock map
/// does not grow with every media item ever looked up.
pub struct BackgroundWorker {
    locks: UrlLocks,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl BackgroundWorker {
    pub fn new(locks: UrlLocks, interval_secs: u64, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            locks,
            interval: Duration::from_secs(interval_secs),
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Maintenance worker started");

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("Maintenance worker shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.locks.cleanup();
                    tracing::debug!("Pruned idle scan locks");
                }
            }
        }
    }
}
