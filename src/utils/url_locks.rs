use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A mutex keyed by media URL, serializing scan triggers for the same URL
/// so at most one request per media item is ever in flight.
#[derive(Debug, Clone, Default)]
pub struct UrlLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl UrlLocks {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Acquires the lock for the given URL.
    /// The lock is released when the returned guard is dropped.
    pub async fn acquire(&self, url: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        // The inner Arc<Mutex> stays alive in the map, so the owned guard
        // outliving this entry lookup is safe. Entries accumulate until
        // cleanup() prunes the idle ones.
        mutex.lock_owned().await
    }

    /// Removes locks that are not currently held by any task.
    /// Called periodically by the maintenance worker to bound memory growth.
    pub fn cleanup(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serializes_same_url() {
        let locks = UrlLocks::new();
        let guard = locks.acquire("mxc://a/1").await;

        let contended = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = contended.acquire("mxc://a/1").await;
        });

        // The second acquire must block while the first guard is held.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn different_urls_do_not_contend() {
        let locks = UrlLocks::new();
        let _a = locks.acquire("mxc://a/1").await;
        // Must not deadlock.
        let _b = locks.acquire("mxc://a/2").await;
    }

    #[tokio::test]
    async fn cleanup_prunes_idle_entries() {
        let locks = UrlLocks::new();
        {
            let _g = locks.acquire("mxc://a/1").await;
            locks.cleanup();
            assert_eq!(locks.len(), 1, "held lock must survive cleanup");
        }
        locks.cleanup();
        assert_eq!(locks.len(), 0);
    }
}
