//! Application configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::entities::DisplayOptions;
use crate::domain::errors::RegistryError;
use crate::domain::ports::SourceContext;
use crate::infrastructure::image::{DEFAULT_MAX_CACHE_SIZE, DownloaderConfig, default_cache_dir};
use crate::infrastructure::source::{AuthorityContentResolver, DirectoryResourceResolver};
use crate::infrastructure::uri::{UnmatchedUriPolicy, UriModelRegistry};

use super::args::{CliArgs, Command};

const APP_NAME: &str = "sketch";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Memory and disk cache sizing.
    #[serde(default)]
    pub cache: CacheConfig,

    /// HTTP downloader settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Roots for local sources.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// URI resolution settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Dispatcher settings and default display options.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum decoded images kept in memory.
    #[serde(default = "default_memory_cache_size")]
    pub memory_cache_size: usize,

    /// Maximum disk cache size in bytes.
    #[serde(default = "default_disk_cache_size")]
    pub disk_cache_size: u64,

    /// Disk cache directory. Defaults to the platform cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_cache_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_cache_size: default_memory_cache_size(),
            disk_cache_size: default_disk_cache_size(),
            disk_cache_dir: None,
        }
    }
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Maximum concurrent downloads.
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: default_max_concurrent_downloads(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

/// Local source roots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Directory `asset://` names resolve under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_root: Option<PathBuf>,

    /// Directory `drawable://` ids resolve under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawable_root: Option<PathBuf>,

    /// Content provider authorities mapped to directories.
    #[serde(default)]
    pub content_providers: HashMap<String, PathBuf>,
}

/// URI resolution configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// What to do with URIs no model accepts.
    #[serde(default)]
    pub unmatched: UnmatchedUriPolicy,
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Maximum requests executing at once.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Options applied to requests that don't set their own.
    #[serde(flatten)]
    pub options: DisplayOptions,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent_requests(),
            options: DisplayOptions::default(),
        }
    }
}

const fn default_memory_cache_size() -> usize {
    50
}

const fn default_disk_cache_size() -> u64 {
    DEFAULT_MAX_CACHE_SIZE
}

const fn default_max_concurrent_downloads() -> usize {
    4
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_concurrent_requests() -> usize {
    8
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(cache_dir) = &args.cache_dir {
            self.cache.disk_cache_dir = Some(cache_dir.clone());
        }
        if let Some(asset_root) = &args.asset_root {
            self.sources.asset_root = Some(asset_root.clone());
        }
        if let Some(drawable_root) = &args.drawable_root {
            self.sources.drawable_root = Some(drawable_root.clone());
        }
        if let Some(unmatched) = args.unmatched {
            self.resolver.unmatched = unmatched;
        }
        if let Command::Load {
            level,
            no_disk_cache,
            ..
        } = &args.command
        {
            if let Some(level) = level {
                self.display.options.request_level = (*level).into();
            }
            if *no_disk_cache {
                self.display.options.cache_in_disk = false;
            }
        }
    }

    /// Builds the URI registry with the configured unmatched policy.
    ///
    /// # Errors
    /// Returns error if the built-in models conflict.
    pub fn build_registry(&self) -> Result<UriModelRegistry, RegistryError> {
        UriModelRegistry::builder()
            .with_defaults()
            .unmatched(self.resolver.unmatched)
            .build()
    }

    /// Builds the data source context from the configured roots.
    #[must_use]
    pub fn source_context(&self) -> SourceContext {
        let mut context = SourceContext::new();
        if let Some(root) = &self.sources.asset_root {
            context = context.with_asset_root(root.clone());
        }
        if let Some(root) = &self.sources.drawable_root {
            context = context.with_resources(Arc::new(DirectoryResourceResolver::new(root.clone())));
        }
        if !self.sources.content_providers.is_empty() {
            let resolver = self
                .sources
                .content_providers
                .iter()
                .fold(AuthorityContentResolver::new(), |resolver, (authority, root)| {
                    resolver.with_provider(authority.clone(), root.clone())
                });
            context = context.with_content_resolver(Arc::new(resolver));
        }
        context
    }

    /// Returns the downloader settings.
    #[must_use]
    pub fn downloader_config(&self) -> DownloaderConfig {
        let defaults = DownloaderConfig::default();
        DownloaderConfig {
            max_concurrent_downloads: self.network.max_concurrent_downloads,
            timeout_secs: self.network.timeout_secs,
            user_agent: self.network.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }

    /// Returns the disk cache directory.
    #[must_use]
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache.disk_cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("sketch.log"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}
