//! URI resolution and registry error types.

use thiserror::Error;

/// URI resolution error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum UriError {
    #[error("no uri model matches '{uri}'")]
    Unresolved { uri: String },
}

impl UriError {
    /// Creates unresolved error.
    #[must_use]
    pub fn unresolved(uri: impl Into<String>) -> Self {
        Self::Unresolved { uri: uri.into() }
    }
}

/// Registry construction and installation error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum RegistryError {
    #[error("scheme '{scheme}' of {model} is ambiguous with '{existing}' of {existing_model}")]
    SchemeConflict {
        scheme: String,
        model: String,
        existing: String,
        existing_model: String,
    },

    #[error("model {model} declares no scheme")]
    NoScheme { model: String },

    #[error("global uri model registry is already installed")]
    AlreadyInstalled,
}
