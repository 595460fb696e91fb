//! Port definition for URI scheme models.

use std::fmt;

use crate::domain::entities::{DownloadResult, UriInfo};
use crate::domain::errors::{SourceError, UriError};

use super::{DataSource, SourceContext};

/// Closed set of source families a model can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UriKind {
    /// `http://` and `https://`.
    Network,
    /// Absolute paths and `file://`.
    File,
    /// `content://` provider URIs.
    Content,
    /// `asset://` application assets.
    Asset,
    /// `drawable://` embedded resources.
    Drawable,
    /// Inline base64 image data.
    Base64,
    /// Models registered by the application.
    Custom(&'static str),
}

impl fmt::Display for UriKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => f.write_str("network"),
            Self::File => f.write_str("file"),
            Self::Content => f.write_str("content"),
            Self::Asset => f.write_str("asset"),
            Self::Drawable => f.write_str("drawable"),
            Self::Base64 => f.write_str("base64"),
            Self::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// Strategy for recognizing and resolving one URI scheme family.
///
/// Implementations hold no mutable state and every method except
/// [`UriModel::data_source`] is a pure function of its input.
pub trait UriModel: Send + Sync + 'static {
    /// Family this model belongs to.
    fn kind(&self) -> UriKind;

    /// Prefixes this model owns. Used to reject ambiguous registrations.
    fn schemes(&self) -> &'static [&'static str];

    /// Returns true if this model owns `uri`. Empty input never matches.
    fn matches(&self, uri: &str) -> bool {
        !uri.is_empty() && self.schemes().iter().any(|scheme| uri.starts_with(scheme))
    }

    /// Returns `uri` without its scheme, or `uri` unchanged if not matched.
    fn uri_content(&self, uri: &str) -> String {
        strip_scheme(uri, self.schemes()).unwrap_or(uri).to_string()
    }

    /// Returns the disk-cache identity of the resource `uri` names.
    fn disk_cache_key(&self, uri: &str) -> String;

    /// Returns true if bytes must be downloaded before decoding.
    fn is_from_net(&self) -> bool {
        false
    }

    /// Builds the byte source for a resolved URI.
    ///
    /// `download` is only read by network models, which fail with
    /// [`SourceError::MissingDownloadResult`] when it is absent.
    ///
    /// # Errors
    /// Returns [`SourceError`] if the source cannot be located.
    fn data_source(
        &self,
        context: &SourceContext,
        info: &UriInfo,
        download: Option<&DownloadResult>,
    ) -> Result<Box<dyn DataSource>, SourceError>;
}

/// Maps URI strings to their model.
pub trait UriResolver: Send + Sync {
    /// Resolves `uri` into a [`UriInfo`].
    ///
    /// # Errors
    /// Returns [`UriError::Unresolved`] if no model accepts `uri`.
    fn resolve(&self, uri: &str) -> Result<UriInfo, UriError>;
}

/// Strips the first matching scheme from `uri`.
#[must_use]
pub fn strip_scheme<'a>(uri: &'a str, schemes: &[&str]) -> Option<&'a str> {
    schemes.iter().find_map(|scheme| uri.strip_prefix(scheme))
}
