//! Port definitions for caching, downloading and decoding images.

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::entities::{DownloadResult, ImageSize, MemoryCacheKey, UriInfo};

use super::DataSource;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during cache operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Image not found in cache.
    #[error("Image not found: {0}")]
    NotFound(String),
    /// Failed to decode image.
    #[error("Decode error: {0}")]
    DecodeError(String),
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    IoError(String),
    /// Network error during download.
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Port for the in-memory decoded image cache.
/// Implementations must be thread-safe.
#[async_trait::async_trait]
pub trait ImageCachePort: Send + Sync {
    /// Attempts to get an image from the cache.
    /// Returns None if not cached.
    async fn get(&self, key: &MemoryCacheKey) -> Option<Arc<image::DynamicImage>>;

    /// Stores an image in the cache.
    async fn put(&self, key: MemoryCacheKey, image: Arc<image::DynamicImage>);

    /// Removes an image from the cache.
    async fn evict(&self, key: &MemoryCacheKey);

    /// Returns the current number of cached images.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all images from the cache.
    async fn clear(&self);
}

/// Port for the persistent byte cache, keyed by `UriModel::disk_cache_key`.
#[async_trait::async_trait]
pub trait DiskCachePort: Send + Sync {
    /// Returns the file holding `key`, if cached.
    async fn get_path(&self, key: &str) -> Option<PathBuf>;

    /// Returns the cached bytes of `key`.
    async fn get_bytes(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores bytes under `key` and returns the file they were written to.
    async fn put_bytes(&self, key: &str, bytes: &[u8]) -> CacheResult<PathBuf>;

    /// Returns true if `key` is cached.
    async fn contains(&self, key: &str) -> bool;

    /// Removes `key` from the cache.
    async fn evict(&self, key: &str);

    /// Removes every entry.
    async fn clear(&self) -> CacheResult<()>;
}

/// Port for fetching network-backed images.
#[async_trait::async_trait]
pub trait ImageDownloaderPort: Send + Sync {
    /// Downloads the resource behind `info`.
    ///
    /// When `persist` is true the bytes are written to the disk cache under
    /// `info.disk_cache_key()` and the result points at that file.
    async fn download(&self, info: &UriInfo, persist: bool) -> CacheResult<DownloadResult>;
}

/// Port for turning source bytes into pixels.
pub trait ImageDecoderPort: Send + Sync {
    /// Decodes `source`, scaling down to fit `resize` when given.
    ///
    /// # Errors
    /// Returns [`CacheError::DecodeError`] if the bytes are not an image,
    /// or [`CacheError::IoError`] if the source cannot be read.
    fn decode(
        &self,
        source: &dyn DataSource,
        resize: Option<ImageSize>,
    ) -> CacheResult<image::DynamicImage>;
}
