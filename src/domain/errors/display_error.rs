//! Failure reported to display listeners.

use thiserror::Error;

use super::{SourceError, UriError};
use crate::domain::ports::CacheError;

/// Why a display request failed.
#[derive(Debug, Clone, Error)]
pub enum DisplayError {
    /// No model matched the URI.
    #[error(transparent)]
    Unresolved(#[from] UriError),

    /// The data source could not be built or opened.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Download, disk or decode failure in the pipeline.
    #[error(transparent)]
    Pipeline(#[from] CacheError),
}

impl DisplayError {
    /// Returns whether retrying the same request could succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Pipeline(CacheError::NetworkError(_)))
    }
}
