//! LRU cache of decoded images keyed by `MemoryCacheKey`.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::DynamicImage;
use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::domain::entities::MemoryCacheKey;
use crate::domain::ports::ImageCachePort;

/// Default maximum number of images to cache in memory.
pub const DEFAULT_CACHE_SIZE: usize = 50;

/// In-memory cache of decoded images.
///
/// One resource may appear several times, once per requested resize.
pub struct MemoryImageCache {
    entries: RwLock<LruCache<MemoryCacheKey, Arc<DynamicImage>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryImageCache {
    /// Creates a cache holding at most `capacity` images (minimum one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns hit/miss counters and current size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        CacheStats {
            hits,
            misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 * 100.0 / lookups as f64
            },
            size: self.len(),
        }
    }

    /// Looks up an image without touching its recency.
    pub async fn peek(&self, key: &MemoryCacheKey) -> Option<Arc<DynamicImage>> {
        self.entries.read().await.peek(key).cloned()
    }

    /// Drops every resize variant of the resource behind `disk_cache_key`.
    /// Returns how many entries were removed.
    pub async fn evict_resource(&self, disk_cache_key: &str) -> usize {
        let variant_prefix = format!("{disk_cache_key}#resize(");
        let mut entries = self.entries.write().await;
        let doomed: Vec<MemoryCacheKey> = entries
            .iter()
            .map(|(key, _)| key)
            .filter(|key| key.as_str() == disk_cache_key || key.as_str().starts_with(&variant_prefix))
            .cloned()
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        if !doomed.is_empty() {
            debug!(key = %disk_cache_key, count = doomed.len(), "Evicted resource from memory cache");
        }
        doomed.len()
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

/// Memory cache counters.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Lookups that found an image.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Hits as a percentage of lookups.
    pub hit_rate: f64,
    /// Images currently cached.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} images, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}

#[async_trait::async_trait]
impl ImageCachePort for MemoryImageCache {
    async fn get(&self, key: &MemoryCacheKey) -> Option<Arc<DynamicImage>> {
        let found = self.entries.write().await.get(key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        trace!(key = %key, hit = found.is_some(), "Memory cache lookup");
        found
    }

    async fn put(&self, key: MemoryCacheKey, image: Arc<DynamicImage>) {
        trace!(key = %key, "Storing image in memory cache");
        if let Some((evicted, _)) = self.entries.write().await.push(key.clone(), image)
            && evicted != key
        {
            debug!(key = %evicted, "Memory cache full, dropped least recent image");
        }
    }

    async fn evict(&self, key: &MemoryCacheKey) {
        if self.entries.write().await.pop(key).is_some() {
            debug!(key = %key, "Evicted image from memory cache");
        }
    }

    fn len(&self) -> usize {
        // Best effort: a writer holding the lock reads as empty.
        self.entries.try_read().map_or(0, |entries| entries.len())
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
        debug!("Cleared memory image cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ImageSize;

    fn pixels(side: u32) -> Arc<DynamicImage> {
        Arc::new(DynamicImage::new_rgb8(side, side))
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = MemoryImageCache::new(4);
        let key = MemoryCacheKey::new("asset://a.png", None);
        cache.put(key.clone(), pixels(12)).await;

        assert_eq!(cache.get(&key).await.map(|img| img.width()), Some(12));
        assert!(cache.get(&MemoryCacheKey::new("asset://b.png", None)).await.is_none());
    }

    #[tokio::test]
    async fn test_resize_variants_are_separate_entries() {
        let cache = MemoryImageCache::new(4);
        let full = MemoryCacheKey::new("https://x/a.png", None);
        let thumb = MemoryCacheKey::new("https://x/a.png", Some(ImageSize::new(32, 32)));
        cache.put(full.clone(), pixels(128)).await;
        cache.put(thumb.clone(), pixels(32)).await;

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek(&thumb).await.map(|img| img.width()), Some(32));
    }

    #[tokio::test]
    async fn test_evict_resource_drops_all_variants() {
        let cache = MemoryImageCache::new(8);
        cache.put(MemoryCacheKey::new("/a.png", None), pixels(4)).await;
        cache
            .put(MemoryCacheKey::new("/a.png", Some(ImageSize::new(2, 2))), pixels(2))
            .await;
        cache.put(MemoryCacheKey::new("/a.png.bak", None), pixels(4)).await;

        assert_eq!(cache.evict_resource("/a.png").await, 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_least_recent_is_dropped() {
        let cache = MemoryImageCache::new(2);
        let first = MemoryCacheKey::new("asset://1.png", None);
        let second = MemoryCacheKey::new("asset://2.png", None);
        let third = MemoryCacheKey::new("asset://3.png", None);

        cache.put(first.clone(), pixels(1)).await;
        cache.put(second.clone(), pixels(1)).await;
        let _ = cache.get(&first).await;
        cache.put(third, pixels(1)).await;

        assert!(cache.peek(&first).await.is_some());
        assert!(cache.peek(&second).await.is_none());
    }

    #[tokio::test]
    async fn test_stats_count_lookups() {
        let cache = MemoryImageCache::default();
        let key = MemoryCacheKey::new("asset://a.png", None);
        cache.put(key.clone(), pixels(1)).await;

        let _ = cache.get(&key).await;
        let _ = cache.get(&MemoryCacheKey::new("asset://missing.png", None)).await;

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
        assert!((stats.hit_rate - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryImageCache::new(2);
        cache.put(MemoryCacheKey::new("/a.png", None), pixels(1)).await;
        cache.clear().await;
        assert!(cache.is_empty());
    }
}
