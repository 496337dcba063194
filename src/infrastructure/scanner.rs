use crate::config::ScanConfig;
use crate::services::scanner::AvScanner;
use std::sync::Arc;
use tracing::info;

pub async fn setup_scanner(config: &ScanConfig) -> anyhow::Result<Arc<dyn AvScanner>> {
    let scanner = crate::services::scanner::create_scanner(config)?;

    // Warm up scanner connection
    if config.enable_media_scan {
        if scanner.health_check().await {
            info!("🦠 Content scanner reachable at {}", config.scanner_base_url);
        } else {
            tracing::warn!(
                "⚠️  Content scanner unreachable! Lookups will keep returning UNKNOWN until it recovers."
            );
        }
    }

    Ok(scanner.into())
}
