//! Reading and writing `config.toml`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::app_config::AppConfig;

/// Errors raised while reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No platform config directory and no explicit path.
    #[error("no config directory available, pass --config")]
    NoConfigDir,
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The configuration could not be encoded.
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed from an existing file.
    File,
    /// The file was missing and a default one was written.
    Created,
    /// The file did not parse; defaults are used and the file is left alone.
    Defaults,
}

/// A configuration together with its origin.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The configuration.
    pub config: AppConfig,
    /// Where it came from.
    pub origin: ConfigOrigin,
}

/// One `config.toml` on disk.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Uses `path_override` when given, else the platform config file.
    ///
    /// # Errors
    /// Returns [`ConfigError::NoConfigDir`] if neither is available.
    pub fn locate(path_override: Option<&Path>) -> Result<Self, ConfigError> {
        path_override
            .map(Path::to_path_buf)
            .or_else(AppConfig::default_config_path)
            .map(Self::at)
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Uses the file at `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the configuration, writing a default file when none exists.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read, or if a missing
    /// file cannot be created.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let (mut config, origin) = match fs::read_to_string(&self.path) {
            Ok(text) => match toml::from_str::<AppConfig>(&text) {
                Ok(config) => (config, ConfigOrigin::File),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Config file does not parse, using defaults");
                    (AppConfig::default(), ConfigOrigin::Defaults)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = AppConfig::default();
                self.save(&config)?;
                info!(path = %self.path.display(), "Wrote default config file");
                (config, ConfigOrigin::Created)
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        config.config = Some(self.path.clone());
        Ok(LoadedConfig { config, origin })
    }

    /// Replaces the file with `config`.
    ///
    /// Readers see either the old file or the new one, never a partial write.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if encoding or writing fails.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(config)?;
        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };
        fs::create_dir_all(dir).map_err(write_err)?;
        let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        staged.write_all(text.as_bytes()).map_err(write_err)?;
        staged.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(path = %self.path.display(), "Saved config file");
        Ok(())
    }
}
