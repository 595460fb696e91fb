//! Ordered registry of URI models.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::domain::entities::UriInfo;
use crate::domain::errors::{RegistryError, UriError};
use crate::domain::ports::{UriModel, UriResolver};

use super::{
    AssetUriModel, Base64UriModel, Base64VariantUriModel, ContentUriModel, DrawableUriModel,
    FileUriModel, FileVariantUriModel, HttpUriModel, HttpsUriModel,
};

static GLOBAL: OnceLock<Arc<UriModelRegistry>> = OnceLock::new();

/// What `resolve` does with a URI no model matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedUriPolicy {
    /// Fail with [`UriError::Unresolved`].
    #[default]
    Reject,
    /// Treat the string as a raw file path.
    TreatAsFilePath,
}

/// Immutable, ordered list of models; the first match wins.
pub struct UriModelRegistry {
    models: Vec<Arc<dyn UriModel>>,
    unmatched: UnmatchedUriPolicy,
}

impl UriModelRegistry {
    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> UriModelRegistryBuilder {
        UriModelRegistryBuilder::default()
    }

    /// Registry with the built-in models and the `Reject` policy.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            models: default_models(),
            unmatched: UnmatchedUriPolicy::Reject,
        }
    }

    /// Returns the first model that matches `uri`.
    #[must_use]
    pub fn find(&self, uri: &str) -> Option<&Arc<dyn UriModel>> {
        self.models.iter().find(|model| model.matches(uri))
    }

    /// Counts the models that match `uri`.
    #[must_use]
    pub fn match_count(&self, uri: &str) -> usize {
        self.models.iter().filter(|model| model.matches(uri)).count()
    }

    /// Resolves `uri` into a [`UriInfo`].
    ///
    /// # Errors
    /// Returns [`UriError::Unresolved`] for empty input, or for unmatched
    /// input under the `Reject` policy.
    pub fn resolve(&self, uri: &str) -> Result<UriInfo, UriError> {
        if uri.trim().is_empty() {
            return Err(UriError::unresolved(uri));
        }
        if let Some(model) = self.find(uri) {
            return Ok(UriInfo::new(uri, model.clone()));
        }
        match self.unmatched {
            UnmatchedUriPolicy::Reject => Err(UriError::unresolved(uri)),
            UnmatchedUriPolicy::TreatAsFilePath => Ok(UriInfo::new(uri, Arc::new(FileUriModel))),
        }
    }

    /// Returns the unmatched policy.
    #[must_use]
    pub const fn unmatched_policy(&self) -> UnmatchedUriPolicy {
        self.unmatched
    }

    /// Returns the models in priority order.
    pub fn models(&self) -> impl Iterator<Item = &Arc<dyn UriModel>> {
        self.models.iter()
    }
}

impl UriResolver for UriModelRegistry {
    fn resolve(&self, uri: &str) -> Result<UriInfo, UriError> {
        Self::resolve(self, uri)
    }
}

impl Default for UriModelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for UriModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UriModelRegistry")
            .field(
                "schemes",
                &self
                    .models
                    .iter()
                    .flat_map(|model| model.schemes().iter())
                    .collect::<Vec<_>>(),
            )
            .field("unmatched", &self.unmatched)
            .finish()
    }
}

/// Built-in models in priority order.
fn default_models() -> Vec<Arc<dyn UriModel>> {
    vec![
        Arc::new(HttpUriModel),
        Arc::new(HttpsUriModel),
        Arc::new(FileUriModel),
        Arc::new(FileVariantUriModel),
        Arc::new(ContentUriModel),
        Arc::new(AssetUriModel),
        Arc::new(DrawableUriModel),
        Arc::new(Base64UriModel),
        Arc::new(Base64VariantUriModel),
    ]
}

/// Collects models before the registry is frozen.
#[derive(Default)]
pub struct UriModelRegistryBuilder {
    models: Vec<Arc<dyn UriModel>>,
    unmatched: UnmatchedUriPolicy,
}

impl UriModelRegistryBuilder {
    /// Appends the built-in models.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.models.extend(default_models());
        self
    }

    /// Appends a model after those already registered.
    #[must_use]
    pub fn register(mut self, model: Arc<dyn UriModel>) -> Self {
        self.models.push(model);
        self
    }

    /// Sets the unmatched policy.
    #[must_use]
    pub const fn unmatched(mut self, policy: UnmatchedUriPolicy) -> Self {
        self.unmatched = policy;
        self
    }

    /// Freezes the registry.
    ///
    /// # Errors
    /// Returns [`RegistryError::SchemeConflict`] if one registered prefix is
    /// a prefix of another (so a URI could match both), or
    /// [`RegistryError::NoScheme`] for a model without prefixes.
    pub fn build(self) -> Result<UriModelRegistry, RegistryError> {
        let mut seen: Vec<(&'static str, String)> = Vec::new();
        for model in &self.models {
            let name = model.kind().to_string();
            if model.schemes().is_empty() {
                return Err(RegistryError::NoScheme { model: name });
            }
            for scheme in model.schemes() {
                if let Some((existing, existing_model)) = seen
                    .iter()
                    .find(|(other, _)| other.starts_with(scheme) || scheme.starts_with(other))
                {
                    return Err(RegistryError::SchemeConflict {
                        scheme: (*scheme).to_string(),
                        model: name,
                        existing: (*existing).to_string(),
                        existing_model: existing_model.clone(),
                    });
                }
                seen.push((*scheme, name.clone()));
            }
        }
        Ok(UriModelRegistry {
            models: self.models,
            unmatched: self.unmatched,
        })
    }
}

/// Installs the process-wide registry.
///
/// # Errors
/// Returns [`RegistryError::AlreadyInstalled`] once a registry is in place,
/// including the default one [`global`] installs on first use.
pub fn install_global(registry: UriModelRegistry) -> Result<(), RegistryError> {
    GLOBAL
        .set(Arc::new(registry))
        .map_err(|_| RegistryError::AlreadyInstalled)
}

/// Returns the process-wide registry, installing the defaults on first use.
pub fn global() -> Arc<UriModelRegistry> {
    GLOBAL
        .get_or_init(|| Arc::new(UriModelRegistry::with_defaults()))
        .clone()
}
