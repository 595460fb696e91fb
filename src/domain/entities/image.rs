//! Domain types for decoded images and cache identities.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Requested or decoded image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageSize {
    /// Creates a new size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if either dimension is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Key of a decoded image in the memory cache.
///
/// Two requests for the same resource share a memory entry only when they
/// also ask for the same resize, so the resize is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryCacheKey(String);

impl MemoryCacheKey {
    /// Builds a key from a disk-cache key and an optional resize.
    #[must_use]
    pub fn new(disk_cache_key: &str, resize: Option<ImageSize>) -> Self {
        match resize {
            Some(size) if !size.is_empty() => Self(format!("{disk_cache_key}#resize({size})")),
            _ => Self(disk_cache_key.to_string()),
        }
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemoryCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the bytes of an image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFrom {
    /// Downloaded from the network in this request.
    Network,
    /// Read back from the disk cache.
    DiskCache,
    /// Served by the in-memory cache.
    MemoryCache,
    /// Read from a local file.
    LocalFile,
    /// Read from the application's assets.
    Asset,
    /// Read from an embedded drawable resource.
    Drawable,
    /// Read through a content provider.
    Content,
    /// Decoded from bytes embedded in the URI.
    Memory,
}

impl std::fmt::Display for ImageFrom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::DiskCache => write!(f, "disk"),
            Self::MemoryCache => write!(f, "memory"),
            Self::LocalFile => write!(f, "file"),
            Self::Asset => write!(f, "asset"),
            Self::Drawable => write!(f, "drawable"),
            Self::Content => write!(f, "content"),
            Self::Memory => write!(f, "inline"),
        }
    }
}

/// A decoded image ready to be handed to a target.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Memory cache identity of the image.
    pub key: MemoryCacheKey,
    /// Decoded pixels.
    pub image: Arc<image::DynamicImage>,
    /// Where the bytes were read from.
    pub from: ImageFrom,
}

impl LoadedImage {
    /// Returns the decoded dimensions.
    #[must_use]
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.image.width(), self.image.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_key_without_resize_is_disk_key() {
        let key = MemoryCacheKey::new("asset://a.png", None);
        assert_eq!(key.as_str(), "asset://a.png");
    }

    #[test]
    fn test_memory_key_includes_resize() {
        let key = MemoryCacheKey::new("asset://a.png", Some(ImageSize::new(100, 50)));
        assert_eq!(key.as_str(), "asset://a.png#resize(100x50)");
        assert_ne!(key, MemoryCacheKey::new("asset://a.png", None));
    }

    #[test]
    fn test_empty_resize_is_ignored() {
        let key = MemoryCacheKey::new("/a.png", Some(ImageSize::new(0, 50)));
        assert_eq!(key.as_str(), "/a.png");
    }

    #[test]
    fn test_loaded_image_size() {
        let loaded = LoadedImage {
            key: MemoryCacheKey::new("k", None),
            image: Arc::new(image::DynamicImage::new_rgb8(4, 3)),
            from: ImageFrom::LocalFile,
        };
        assert_eq!(loaded.size(), ImageSize::new(4, 3));
    }
}
