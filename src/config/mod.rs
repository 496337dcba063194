use std::env;

/// Configuration for the scan cache service
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Enable anti-virus scanning (default: true)
    pub enable_media_scan: bool,

    /// Scanner type: "content-scanner" or "noop" (default: "content-scanner")
    pub scanner_type: String,

    /// Base URL of the content scanner (default: "http://127.0.0.1:8080")
    pub scanner_base_url: String,

    /// Seconds before an UNKNOWN status is re-checked (default: 10)
    pub rescan_delay_secs: u64,

    /// HTTP timeout for a single scan request in seconds (default: 30)
    pub scan_timeout_secs: u64,

    /// Interval between idle-lock cleanup passes in seconds (default: 60)
    pub lock_cleanup_interval_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            enable_media_scan: true,
            scanner_type: "content-scanner".to_string(),
            scanner_base_url: "http://127.0.0.1:8080".to_string(),
            rescan_delay_secs: 10,
            scan_timeout_secs: 30,
            lock_cleanup_interval_secs: 60,
        }
    }
}

impl ScanConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            enable_media_scan: env::var("ENABLE_MEDIA_SCAN")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default.enable_media_scan),

            scanner_type: env::var("SCANNER_TYPE").unwrap_or(default.scanner_type),

            scanner_base_url: env::var("SCANNER_BASE_URL").unwrap_or(default.scanner_base_url),

            rescan_delay_secs: env::var("RESCAN_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.rescan_delay_secs),

            scan_timeout_secs: env::var("SCAN_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.scan_timeout_secs),

            lock_cleanup_interval_secs: env::var("LOCK_CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.lock_cleanup_interval_secs),
        }
    }

    /// Create config for development (no scanning, instant re-checks)
    pub fn development() -> Self {
        Self {
            enable_media_scan: false,
            scanner_type: "noop".to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert!(config.enable_media_scan);
        assert_eq!(config.scanner_type, "content-scanner");
        assert_eq!(config.rescan_delay_secs, 10);
    }

    #[test]
    fn test_development_config() {
        let config = ScanConfig::development();
        assert!(!config.enable_media_scan);
        assert_eq!(config.scanner_type, "noop");
    }

    #[test]
    fn test_from_env_fallback() {
        unsafe { env::remove_var("RESCAN_DELAY_SECS") };
        let config = ScanConfig::from_env();
        assert_eq!(config.rescan_delay_secs, ScanConfig::default().rescan_delay_secs);
    }
}
