use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

/// Verdict returned by the remote content scanner.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanVerdict {
    pub clean: bool,
    pub info: Option<String>,
}

/// Descriptor of an encrypted media item, as attached to encrypted room
/// events. The scanner decrypts and scans the payload server-side; we only
/// need `url` as the cache key and pass the rest through opaquely.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EncryptedFile {
    pub url: String,
    pub key: serde_json::Value,
    pub iv: String,
    pub hashes: serde_json::Value,
    pub v: String,
}

/// Failure modes of a scan request. The scan manager treats all three the
/// same way (reset to UNKNOWN and allow a later retry), but callers logging
/// or testing the client see which layer failed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("network error reaching content scanner: {0}")]
    Network(#[from] reqwest::Error),

    #[error("content scanner returned {status}: {message}")]
    Protocol { status: u16, message: String },

    #[error("unexpected scanner failure: {0}")]
    Unexpected(String),
}

/// Trait for anti-virus scanning backends.
#[async_trait::async_trait]
pub trait AvScanner: Send + Sync {
    /// Scan an unencrypted media item identified by its server name and
    /// media id (the two components of its mxc URL).
    async fn scan_media(&self, server_name: &str, media_id: &str)
    -> Result<ScanVerdict, ScanError>;

    /// Scan an encrypted media item from its encrypted-file descriptor.
    async fn scan_encrypted(&self, file: &EncryptedFile) -> Result<ScanVerdict, ScanError>;

    /// Check if the scanner is available/healthy.
    async fn health_check(&self) -> bool;
}

/// Non-2xx responses carry a JSON body with diagnostic fields.
#[derive(Debug, Deserialize)]
struct ScannerErrorBody {
    reason: Option<String>,
    info: Option<String>,
}

/// Client for a Matrix content-scanner (media proxy) HTTP API.
pub struct ContentScannerClient {
    http: reqwest::Client,
    base_url: String,
}

impl ContentScannerClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!("{}/_matrix/media_proxy/unstable/{}", self.base_url, suffix)
    }

    async fn parse_response(resp: reqwest::Response) -> Result<ScanVerdict, ScanError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ScannerErrorBody>(&body)
                .ok()
                .and_then(|b| b.info.or(b.reason))
                .unwrap_or(body);
            return Err(ScanError::Protocol {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json::<ScanVerdict>().await?)
    }
}

#[async_trait::async_trait]
impl AvScanner for ContentScannerClient {
    async fn scan_media(
        &self,
        server_name: &str,
        media_id: &str,
    ) -> Result<ScanVerdict, ScanError> {
        let url = self.endpoint(&format!("scan/{}/{}", server_name, media_id));
        tracing::debug!("Requesting scan: {}", url);

        let resp = self.http.get(&url).send().await?;
        Self::parse_response(resp).await
    }

    async fn scan_encrypted(&self, file: &EncryptedFile) -> Result<ScanVerdict, ScanError> {
        let url = self.endpoint("scan_encrypted");
        tracing::debug!("Requesting encrypted scan for {}", file.url);

        let resp = self
            .http
            .post(&url)
            .json(&json!({ "file": file }))
            .send()
            .await?;
        Self::parse_response(resp).await
    }

    async fn health_check(&self) -> bool {
        let url = self.endpoint("public_key");
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

/// No-op scanner for development and for deployments without a content
/// scanner. Everything is reported clean.
pub struct NoOpScanner;

#[async_trait::async_trait]
impl AvScanner for NoOpScanner {
    async fn scan_media(
        &self,
        _server_name: &str,
        _media_id: &str,
    ) -> Result<ScanVerdict, ScanError> {
        tracing::warn!("NoOpScanner: skipping media scan (scanning disabled)");
        Ok(ScanVerdict {
            clean: true,
            info: None,
        })
    }

    async fn scan_encrypted(&self, _file: &EncryptedFile) -> Result<ScanVerdict, ScanError> {
        tracing::warn!("NoOpScanner: skipping encrypted media scan (scanning disabled)");
        Ok(ScanVerdict {
            clean: true,
            info: None,
        })
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Factory function to create the appropriate scanner based on config
pub fn create_scanner(config: &crate::config::ScanConfig) -> anyhow::Result<Box<dyn AvScanner>> {
    if !config.enable_media_scan {
        return Ok(Box::new(NoOpScanner));
    }

    match config.scanner_type.to_lowercase().as_str() {
        "content-scanner" => Ok(Box::new(ContentScannerClient::new(
            &config.scanner_base_url,
            Duration::from_secs(config.scan_timeout_secs),
        )?)),
        "noop" | "none" | "disabled" => Ok(Box::new(NoOpScanner)),
        other => {
            tracing::warn!("Unknown scanner type '{}', using NoOpScanner", other);
            Ok(Box::new(NoOpScanner))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;

    #[tokio::test]
    async fn noop_scanner_reports_clean() {
        let scanner = NoOpScanner;
        let verdict = scanner.scan_media("example.org", "abc").await.unwrap();
        assert!(verdict.clean);
        assert!(scanner.health_check().await);
    }

    #[tokio::test]
    async fn create_scanner_falls_back_to_noop() {
        let mut config = ScanConfig::development();
        config.enable_media_scan = true;
        config.scanner_type = "bogus".to_string();
        let scanner = create_scanner(&config).unwrap();
        assert!(scanner.health_check().await);
    }

    #[tokio::test]
    async fn disabled_scan_uses_noop_regardless_of_type() {
        let mut config = ScanConfig::default();
        config.enable_media_scan = false;
        config.scanner_type = "content-scanner".to_string();
        let scanner = create_scanner(&config).unwrap();
        assert!(
            scanner
                .scan_media("example.org", "abc")
                .await
                .unwrap()
                .clean
        );
    }

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let client =
            ContentScannerClient::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint("scan/example.org/abc"),
            "http://localhost:8080/_matrix/media_proxy/unstable/scan/example.org/abc"
        );
    }
}
