//! Port definitions for opening resolved image bytes.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::entities::ImageFrom;
use crate::domain::errors::SourceError;

/// Readable byte stream handed to decoders.
pub type ByteStream = Box<dyn Read + Send>;

/// Opens a byte stream for one resolved URI.
///
/// The returned stream owns its handle; dropping it releases the file,
/// cursor or buffer on every path.
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Opens a fresh stream positioned at the first byte.
    ///
    /// # Errors
    /// Returns [`SourceError`] if the underlying resource cannot be opened.
    fn open(&self) -> Result<ByteStream, SourceError>;

    /// Returns the byte length if known without reading.
    fn length(&self) -> Option<u64>;

    /// Returns where the bytes come from.
    fn image_from(&self) -> ImageFrom;

    /// Human-readable location used in error messages.
    fn location(&self) -> String;

    /// Reads the whole source into memory.
    ///
    /// # Errors
    /// Returns [`SourceError`] if opening or reading fails.
    fn read_all(&self) -> Result<Vec<u8>, SourceError> {
        let mut stream = self.open()?;
        let capacity = self
            .length()
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(0);
        let mut bytes = Vec::with_capacity(capacity);
        stream
            .read_to_end(&mut bytes)
            .map_err(|e| SourceError::open(self.location(), e.to_string()))?;
        Ok(bytes)
    }
}

/// Resolves embedded drawable resource ids to byte streams.
pub trait ResourceResolver: Send + Sync {
    /// Opens the resource with `id`.
    ///
    /// # Errors
    /// Returns [`SourceError::NotFound`] if no resource has this id.
    fn open_drawable(&self, id: &str) -> Result<ByteStream, SourceError>;

    /// Returns the resource length, if known.
    fn drawable_length(&self, _id: &str) -> Option<u64> {
        None
    }
}

/// Resolves `content://` URIs through their provider.
pub trait ContentResolver: Send + Sync {
    /// Opens the content behind `uri`.
    ///
    /// # Errors
    /// Returns [`SourceError`] if the provider is unknown, the permission
    /// was revoked or the item is gone.
    fn open(&self, uri: &str) -> Result<ByteStream, SourceError>;

    /// Returns the content length, if known.
    fn length(&self, _uri: &str) -> Option<u64> {
        None
    }
}

/// Local stores a `UriModel` may open sources against.
#[derive(Clone, Default)]
pub struct SourceContext {
    asset_root: Option<PathBuf>,
    resources: Option<Arc<dyn ResourceResolver>>,
    content: Option<Arc<dyn ContentResolver>>,
}

impl SourceContext {
    /// Creates an empty context; only file and network sources will open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory assets are read from.
    #[must_use]
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Sets the drawable resource resolver.
    #[must_use]
    pub fn with_resources(mut self, resolver: Arc<dyn ResourceResolver>) -> Self {
        self.resources = Some(resolver);
        self
    }

    /// Sets the content provider resolver.
    #[must_use]
    pub fn with_content_resolver(mut self, resolver: Arc<dyn ContentResolver>) -> Self {
        self.content = Some(resolver);
        self
    }

    /// Returns the asset root.
    #[must_use]
    pub fn asset_root(&self) -> Option<&Path> {
        self.asset_root.as_deref()
    }

    /// Returns the drawable resolver.
    #[must_use]
    pub fn resources(&self) -> Option<&Arc<dyn ResourceResolver>> {
        self.resources.as_ref()
    }

    /// Returns the content resolver.
    #[must_use]
    pub fn content_resolver(&self) -> Option<&Arc<dyn ContentResolver>> {
        self.content.as_ref()
    }
}

impl fmt::Debug for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceContext")
            .field("asset_root", &self.asset_root)
            .field("has_resources", &self.resources.is_some())
            .field("has_content_resolver", &self.content.is_some())
            .finish()
    }
}
