//! Display request value objects.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ImageSize, MemoryCacheKey, UriInfo};
use crate::domain::errors::RequestError;
use crate::domain::ports::DisplayListener;

/// Unique identifier of a display request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner uuid.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a UI target an image is displayed into.
///
/// Requests refer to targets only by id, so a request never keeps its
/// target alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl From<u64> for TargetId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target-{}", self.0)
    }
}

/// How far down the source chain a request is allowed to go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestLevel {
    /// Memory, disk and network.
    #[default]
    Net,
    /// Memory, disk and local sources; network downloads are skipped.
    Local,
    /// Memory cache only.
    Memory,
}

/// Display options applied to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// Image URI shown while loading (applied by the caller).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading_image: Option<String>,

    /// Image URI shown on failure (applied by the caller).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_image: Option<String>,

    /// Keep the decoded image in the memory cache.
    #[serde(default = "default_true")]
    pub cache_in_memory: bool,

    /// Persist downloaded bytes in the disk cache.
    #[serde(default = "default_true")]
    pub cache_in_disk: bool,

    /// Scale the decoded image down to fit this size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<ImageSize>,

    /// Source chain limit.
    #[serde(default)]
    pub request_level: RequestLevel,
}

fn default_true() -> bool {
    true
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            loading_image: None,
            error_image: None,
            cache_in_memory: true,
            cache_in_disk: true,
            resize: None,
            request_level: RequestLevel::Net,
        }
    }
}

/// Named fields for constructing a [`DisplayRequest`].
#[derive(Clone, Default)]
pub struct DisplayRequestConfig {
    /// URI of the image to load. Required.
    pub image_uri: Option<String>,
    /// Target to display into. Required.
    pub target: Option<TargetId>,
    /// Diagnostic name; defaults to the URI.
    pub name: Option<String>,
    /// Display options.
    pub options: DisplayOptions,
    /// Measured size of the target.
    pub target_size: Option<ImageSize>,
    /// Optional outcome listener.
    pub listener: Option<Arc<dyn DisplayListener>>,
}

/// One load-and-display operation bound to one target.
pub struct DisplayRequest {
    id: RequestId,
    name: String,
    uri: String,
    target: TargetId,
    options: DisplayOptions,
    target_size: Option<ImageSize>,
    listener: Option<Arc<dyn DisplayListener>>,
    uri_info: OnceLock<UriInfo>,
}

impl DisplayRequest {
    /// Validates `config` and builds an immutable request.
    ///
    /// # Errors
    /// Returns [`RequestError::Invalid`] if the URI or target is missing, or
    /// if a supplied size has a zero dimension.
    pub fn new(config: DisplayRequestConfig) -> Result<Self, RequestError> {
        let uri = config
            .image_uri
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| RequestError::invalid("image uri is required"))?;
        let target = config
            .target
            .ok_or_else(|| RequestError::invalid("target is required"))?;

        if config.target_size.is_some_and(|size| size.is_empty()) {
            return Err(RequestError::invalid("target size must be non-zero"));
        }
        if config.options.resize.is_some_and(|size| size.is_empty()) {
            return Err(RequestError::invalid("resize must be non-zero"));
        }

        Ok(Self {
            id: RequestId::generate(),
            name: config.name.unwrap_or_else(|| uri.clone()),
            uri,
            target,
            options: config.options,
            target_size: config.target_size,
            listener: config.listener,
            uri_info: OnceLock::new(),
        })
    }

    /// Returns the request id.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the diagnostic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the image URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the target id.
    #[must_use]
    pub const fn target(&self) -> TargetId {
        self.target
    }

    /// Returns the display options.
    #[must_use]
    pub const fn options(&self) -> &DisplayOptions {
        &self.options
    }

    /// Returns the measured target size.
    #[must_use]
    pub const fn target_size(&self) -> Option<ImageSize> {
        self.target_size
    }

    /// Returns the listener.
    #[must_use]
    pub fn listener(&self) -> Option<&Arc<dyn DisplayListener>> {
        self.listener.as_ref()
    }

    /// Returns the resolved URI, once resolution has happened.
    #[must_use]
    pub fn uri_info(&self) -> Option<&UriInfo> {
        self.uri_info.get()
    }

    /// Records the resolved URI. The first resolution wins.
    pub fn attach_uri_info(&self, info: UriInfo) -> &UriInfo {
        self.uri_info.get_or_init(|| info)
    }

    /// Size the decoded image is scaled to: explicit resize, else target size.
    #[must_use]
    pub fn effective_resize(&self) -> Option<ImageSize> {
        self.options.resize.or(self.target_size)
    }

    /// Memory cache key, available after resolution.
    #[must_use]
    pub fn memory_cache_key(&self) -> Option<MemoryCacheKey> {
        self.uri_info()
            .map(|info| MemoryCacheKey::new(info.disk_cache_key(), self.effective_resize()))
    }
}

impl fmt::Debug for DisplayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayRequest")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("uri", &self.uri)
            .field("target", &self.target)
            .field("options", &self.options)
            .field("target_size", &self.target_size)
            .field("has_listener", &self.listener.is_some())
            .field("uri_info", &self.uri_info.get())
            .finish()
    }
}
