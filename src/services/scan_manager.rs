use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::entities::{ScanStatus, media_scans};
use crate::services::scan_store::MediaScanStore;
use crate::services::scanner::{AvScanner, EncryptedFile, ScanVerdict};
use crate::utils::mxc::MxcUri;
use crate::utils::url_locks::UrlLocks;

/// What the background scan task should ask the scanner for.
enum ScanTarget {
    Unencrypted(MxcUri),
    Encrypted(EncryptedFile),
}

/// Decides whether a cached verdict is stale and, if so, dispatches exactly
/// one scan request per URL, updating the store when the response arrives.
///
/// Lookups return the record as of trigger time (IN_PROGRESS when a scan was
/// just dispatched); callers observe the final verdict on a later read.
pub struct MediaScanManager {
    store: MediaScanStore,
    scanner: Arc<dyn AvScanner>,
    locks: UrlLocks,
    rescan_delay: Duration,
}

impl MediaScanManager {
    pub fn new(
        store: MediaScanStore,
        scanner: Arc<dyn AvScanner>,
        locks: UrlLocks,
        rescan_delay_secs: u64,
    ) -> Self {
        Self {
            store,
            scanner,
            locks,
            rescan_delay: Duration::seconds(rescan_delay_secs as i64),
        }
    }

    /// Looks up the scan status of an unencrypted media item, triggering a
    /// scan if the cached status is stale.
    pub async fn scan_unencrypted_media(
        &self,
        mxc_url: &str,
    ) -> anyhow::Result<media_scans::Model> {
        let mxc = MxcUri::parse(mxc_url)?;
        self.lookup_and_trigger(&mxc.to_string(), ScanTarget::Unencrypted(mxc))
            .await
    }

    /// Looks up the scan status of an encrypted media item. The descriptor's
    /// `url` field is the cache key.
    pub async fn scan_encrypted_media(
        &self,
        file: &EncryptedFile,
    ) -> anyhow::Result<media_scans::Model> {
        let mxc = MxcUri::parse(&file.url)?;
        self.lookup_and_trigger(&mxc.to_string(), ScanTarget::Encrypted(file.clone()))
            .await
    }

    /// Read-only view of a cached status (still lazily creates the default
    /// UNKNOWN record, never dispatches a scan).
    pub async fn get_media_scan(&self, mxc_url: &str) -> anyhow::Result<media_scans::Model> {
        let mxc = MxcUri::parse(mxc_url)?;
        self.store.get(&mxc.to_string()).await
    }

    /// Deletes every cached verdict (privacy action). Subsequent lookups
    /// start from UNKNOWN and re-scan.
    pub async fn clear_all(&self) -> anyhow::Result<u64> {
        self.store.clear_all().await
    }

    async fn lookup_and_trigger(
        &self,
        url: &str,
        target: ScanTarget,
    ) -> anyhow::Result<media_scans::Model> {
        // The per-URL lock makes check-then-mark atomic with respect to
        // other lookups: a second caller waits here, then sees IN_PROGRESS
        // and does not dispatch a duplicate request.
        let _guard = self.locks.acquire(url).await;

        let record = self.store.get(url).await?;
        if !self.is_scan_due(&record, Utc::now()) {
            return Ok(record);
        }

        let record = self
            .store
            .set(url, ScanStatus::InProgress, None, Utc::now())
            .await?;

        self.dispatch(url.to_owned(), target);

        Ok(record)
    }

    /// A status is re-checked only if currently UNKNOWN, and its timestamp
    /// is absent, older than the re-check delay, or in the future (a future
    /// timestamp is corrupt and treated as stale).
    fn is_scan_due(&self, record: &media_scans::Model, now: DateTime<Utc>) -> bool {
        if record.scan_status != ScanStatus::Unknown {
            return false;
        }

        match record.scan_date {
            None => true,
            Some(date) if date > now => true,
            Some(date) => now - date > self.rescan_delay,
        }
    }

    fn dispatch(&self, url: String, target: ScanTarget) {
        let store = self.store.clone();
        let scanner = self.scanner.clone();
        let locks = self.locks.clone();

        tokio::spawn(async move {
            let outcome = match &target {
                ScanTarget::Unencrypted(mxc) => {
                    scanner.scan_media(&mxc.server_name, &mxc.media_id).await
                }
                ScanTarget::Encrypted(file) => scanner.scan_encrypted(file).await,
            };

            let _guard = locks.acquire(&url).await;
            match outcome {
                Ok(verdict) => {
                    if let Err(e) = record_verdict(&store, &url, verdict).await {
                        warn!("Failed to store scan verdict for {}: {}", url, e);
                    }
                }
                Err(e) => {
                    // Network, protocol and unexpected failures all land
                    // here: back to UNKNOWN so a later lookup retries.
                    debug!("Scan failed for {}: {}", url, e);
                    if let Err(e) = store.reset_if_in_progress(&url, Utc::now()).await {
                        warn!("Failed to reset scan status for {}: {}", url, e);
                    }
                }
            }
        });
    }
}

async fn record_verdict(
    store: &MediaScanStore,
    url: &str,
    verdict: ScanVerdict,
) -> anyhow::Result<()> {
    let status = if verdict.clean {
        ScanStatus::Trusted
    } else {
        ScanStatus::Infected
    };

    debug!("Scan verdict for {}: {:?}", url, status);
    store.set(url, status, verdict.info, Utc::now()).await?;
    Ok(())
}
