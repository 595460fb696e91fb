//! Resolved URI record.

use std::fmt;
use std::sync::Arc;

use crate::domain::ports::{UriKind, UriModel};

/// Immutable result of matching a URI against a `UriModel`.
///
/// Content and disk-cache key are derived once here and never recomputed.
#[derive(Clone)]
pub struct UriInfo {
    uri: String,
    model: Arc<dyn UriModel>,
    content: String,
    disk_cache_key: String,
}

impl UriInfo {
    /// Derives content and disk-cache key of `uri` with `model`.
    #[must_use]
    pub fn new(uri: impl Into<String>, model: Arc<dyn UriModel>) -> Self {
        let uri = uri.into();
        let content = model.uri_content(&uri);
        let disk_cache_key = model.disk_cache_key(&uri);
        Self {
            uri,
            model,
            content,
            disk_cache_key,
        }
    }

    /// Returns the original URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the matched model.
    #[must_use]
    pub fn model(&self) -> &Arc<dyn UriModel> {
        &self.model
    }

    /// Returns the URI with its scheme stripped.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the disk-cache key.
    #[must_use]
    pub fn disk_cache_key(&self) -> &str {
        &self.disk_cache_key
    }

    /// Returns the matched model's kind.
    #[must_use]
    pub fn kind(&self) -> UriKind {
        self.model.kind()
    }

    /// Returns true if bytes must be downloaded first.
    #[must_use]
    pub fn is_from_net(&self) -> bool {
        self.model.is_from_net()
    }
}

impl fmt::Debug for UriInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UriInfo")
            .field("uri", &self.uri)
            .field("kind", &self.model.kind())
            .field("content", &self.content)
            .field("disk_cache_key", &self.disk_cache_key)
            .finish()
    }
}
