//! Application configuration.

pub mod app_config;
pub mod args;
pub mod storage;

pub use app_config::{
    AppConfig, CacheConfig, DisplayConfig, LogLevel, NetworkConfig, ResolverConfig, SourcesConfig,
};
pub use args::{CliArgs, Command, LevelArg};
pub use storage::{ConfigError, ConfigOrigin, ConfigStore, LoadedConfig};
