//! `content://` provider model.

use crate::domain::entities::{DownloadResult, UriInfo};
use crate::domain::errors::SourceError;
use crate::domain::ports::{DataSource, SourceContext, UriKind, UriModel};
use crate::infrastructure::source::ContentDataSource;

/// Content provider URIs, opened through the context's `ContentResolver`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentUriModel;

impl ContentUriModel {
    /// Scheme prefix.
    pub const SCHEME: &'static str = "content://";
}

impl UriModel for ContentUriModel {
    fn kind(&self) -> UriKind {
        UriKind::Content
    }

    fn schemes(&self) -> &'static [&'static str] {
        &[Self::SCHEME]
    }

    fn disk_cache_key(&self, uri: &str) -> String {
        uri.to_string()
    }

    fn data_source(
        &self,
        context: &SourceContext,
        info: &UriInfo,
        _download: Option<&DownloadResult>,
    ) -> Result<Box<dyn DataSource>, SourceError> {
        let resolver = context
            .content_resolver()
            .ok_or_else(|| SourceError::no_resolver("content", info.uri()))?;
        Ok(Box::new(ContentDataSource::new(resolver.clone(), info.uri())))
    }
}
