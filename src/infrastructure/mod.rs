//! Infrastructure layer with adapters for the domain ports.

/// Target binding table.
pub mod binding;
/// Application configuration.
pub mod config;
/// Image caches, downloader and decoder.
pub mod image;
/// Data source adapters.
pub mod source;
/// URI models and registry.
pub mod uri;

pub use binding::InMemoryTargetBinding;
pub use config::{AppConfig, CliArgs, Command, ConfigStore, LogLevel};
pub use image::{
    CacheStats, DiskImageCache, DownloaderConfig, HttpImageDownloader, ImageCrateDecoder,
    MemoryImageCache,
};
pub use uri::{UnmatchedUriPolicy, UriModelRegistry, UriModelRegistryBuilder};
