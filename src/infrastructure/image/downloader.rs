//! HTTP downloader producing `DownloadResult`s.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::domain::entities::{DownloadResult, ImageFrom, UriInfo};
use crate::domain::ports::{CacheError, CacheResult, DiskCachePort, ImageDownloaderPort};

/// Settings for [`HttpImageDownloader`].
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Maximum concurrent downloads.
    pub max_concurrent_downloads: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 4,
            timeout_secs: 30,
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

/// Downloads network images with reqwest and optionally persists them.
pub struct HttpImageDownloader {
    client: reqwest::Client,
    disk_cache: Arc<dyn DiskCachePort>,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for HttpImageDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpImageDownloader")
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

impl HttpImageDownloader {
    /// Creates a downloader writing to `disk_cache`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &DownloaderConfig, disk_cache: Arc<dyn DiskCachePort>) -> CacheResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CacheError::NetworkError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            disk_cache,
            permits: Arc::new(Semaphore::new(config.max_concurrent_downloads.max(1))),
        })
    }

    /// Downloads image bytes from a URL.
    async fn fetch(&self, url: &str) -> CacheResult<(Bytes, Option<String>)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CacheError::NetworkError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CacheError::NetworkError(format!(
                "HTTP {}: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CacheError::NetworkError(format!("Failed to read body: {e}")))?;

        Ok((bytes, content_type))
    }
}

#[async_trait::async_trait]
impl ImageDownloaderPort for HttpImageDownloader {
    async fn download(&self, info: &UriInfo, persist: bool) -> CacheResult<DownloadResult> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| CacheError::NetworkError(format!("Downloader closed: {e}")))?;

        debug!(uri = %info.uri(), "Downloading image from network");
        let (bytes, content_type) = self.fetch(info.uri()).await?;

        if bytes.is_empty() {
            return Err(CacheError::NetworkError(format!(
                "Empty response body for {}",
                info.uri()
            )));
        }
        if let Some(ctype) = content_type.as_deref()
            && !ctype.starts_with("image/")
        {
            debug!(uri = %info.uri(), content_type = %ctype, "Response is not declared as an image");
        }

        if persist {
            match self
                .disk_cache
                .put_bytes(info.disk_cache_key(), &bytes)
                .await
            {
                Ok(path) => {
                    return Ok(DownloadResult::persisted(
                        path,
                        bytes.len() as u64,
                        ImageFrom::Network,
                    ));
                }
                Err(e) => {
                    warn!(uri = %info.uri(), error = %e, "Failed to cache to disk");
                }
            }
        }

        Ok(DownloadResult::in_memory(bytes, ImageFrom::Network))
    }
}
