//! `drawable://` model.

use crate::domain::entities::{DownloadResult, UriInfo};
use crate::domain::errors::SourceError;
use crate::domain::ports::{DataSource, SourceContext, UriKind, UriModel};
use crate::infrastructure::source::DrawableDataSource;

/// Embedded drawable resources addressed by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawableUriModel;

impl DrawableUriModel {
    /// Scheme prefix.
    pub const SCHEME: &'static str = "drawable://";

    /// Builds the URI of resource `id`.
    #[must_use]
    pub fn make_uri(id: u32) -> String {
        format!("{}{id}", Self::SCHEME)
    }
}

impl UriModel for DrawableUriModel {
    fn kind(&self) -> UriKind {
        UriKind::Drawable
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
        let resources = context
            .resources()
            .ok_or_else(|| SourceError::no_resolver("drawable", info.uri()))?;
        Ok(Box::new(DrawableDataSource::new(
            resources.clone(),
            info.content(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawable_model() {
        let uri = DrawableUriModel::make_uri(2_131_165_184);
        assert_eq!(uri, "drawable://2131165184");
        assert!(DrawableUriModel.matches(&uri));
        assert_eq!(DrawableUriModel.uri_content(&uri), "2131165184");
        assert_eq!(DrawableUriModel.disk_cache_key(&uri), uri);
    }
}
