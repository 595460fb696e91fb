//! Data source error types.

use std::path::Path;

use thiserror::Error;

/// Errors raised while building or opening a data source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum SourceError {
    #[error("failed to open '{uri}': {message}")]
    Open { uri: String, message: String },

    #[error("source not found: {uri}")]
    NotFound { uri: String },

    #[error("'{name}' escapes the source root")]
    PathEscapesRoot { name: String },

    #[error("network uri '{uri}' needs a completed download")]
    MissingDownloadResult { uri: String },

    #[error("invalid base64 payload in '{uri}': {message}")]
    InvalidBase64 { uri: String, message: String },

    #[error("no {resolver} resolver configured for '{uri}'")]
    NoResolver { resolver: &'static str, uri: String },
}

impl SourceError {
    /// Creates open error.
    #[must_use]
    pub fn open(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Open {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// Maps an I/O failure on `path` to `NotFound` or `Open`.
    #[must_use]
    pub fn from_io(path: &Path, err: &std::io::Error) -> Self {
        let uri = path.display().to_string();
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { uri }
        } else {
            Self::open(uri, err.to_string())
        }
    }

    /// Creates missing download error.
    #[must_use]
    pub fn missing_download(uri: impl Into<String>) -> Self {
        Self::MissingDownloadResult { uri: uri.into() }
    }

    /// Creates no resolver error.
    #[must_use]
    pub fn no_resolver(resolver: &'static str, uri: impl Into<String>) -> Self {
        Self::NoResolver {
            resolver,
            uri: uri.into(),
        }
    }

    /// Returns whether the resource simply does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
