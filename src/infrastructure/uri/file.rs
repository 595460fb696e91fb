//! Absolute path and `file://` models.
//!
//! `/sdcard/a.png` and `file:///sdcard/a.png` name the same file, so both
//! models key the disk cache by the bare path.

use crate::domain::entities::{DownloadResult, UriInfo};
use crate::domain::errors::SourceError;
use crate::domain::ports::{DataSource, SourceContext, UriKind, UriModel};
use crate::infrastructure::source::FileDataSource;

/// Absolute filesystem paths. The path is its own content.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileUriModel;

impl FileUriModel {
    /// Prefix every absolute path starts with.
    pub const SCHEME: &'static str = "/";
}

impl UriModel for FileUriModel {
    fn kind(&self) -> UriKind {
        UriKind::File
    }

    fn schemes(&self) -> &'static [&'static str] {
        &[Self::SCHEME]
    }

    fn uri_content(&self, uri: &str) -> String {
        uri.to_string()
    }

    fn disk_cache_key(&self, uri: &str) -> String {
        uri.to_string()
    }

    fn data_source(
        &self,
        _context: &SourceContext,
        info: &UriInfo,
        _download: Option<&DownloadResult>,
    ) -> Result<Box<dyn DataSource>, SourceError> {
        Ok(Box::new(FileDataSource::local(info.content())))
    }
}

/// `file://` URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileVariantUriModel;

impl FileVariantUriModel {
    /// Scheme prefix.
    pub const SCHEME: &'static str = "file://";

    /// Turns an absolute path into a `file://` URI; URIs pass through.
    #[must_use]
    pub fn make_uri(path: &str) -> Option<String> {
        if path.is_empty() {
            return None;
        }
        if path.starts_with(Self::SCHEME) {
            return Some(path.to_string());
        }
        Some(format!("{}{path}", Self::SCHEME))
    }
}

impl UriModel for FileVariantUriModel {
    fn kind(&self) -> UriKind {
        UriKind::File
    }

    fn schemes(&self) -> &'static [&'static str] {
        &[Self::SCHEME]
    }

    fn disk_cache_key(&self, uri: &str) -> String {
        self.uri_content(uri)
    }

    fn data_source(
        &self,
        _context: &SourceContext,
        info: &UriInfo,
        _download: Option<&DownloadResult>,
    ) -> Result<Box<dyn DataSource>, SourceError> {
        Ok(Box::new(FileDataSource::local(info.content())))
    }
}
