//! Image handling infrastructure.
//!
//! This module provides:
//! - Memory caching with LRU eviction
//! - Disk caching for downloaded bytes
//! - HTTP downloading
//! - Decoding and downscaling

pub mod decoder;
pub mod disk_cache;
pub mod downloader;
pub mod memory_cache;

pub use decoder::ImageCrateDecoder;
pub use disk_cache::{DEFAULT_MAX_CACHE_SIZE, DiskImageCache, default_cache_dir};
pub use downloader::{DownloaderConfig, HttpImageDownloader};
pub use memory_cache::{CacheStats, MemoryImageCache};
