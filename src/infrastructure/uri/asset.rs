//! `asset://` model.

use crate::domain::entities::{DownloadResult, UriInfo};
use crate::domain::errors::SourceError;
use crate::domain::ports::{DataSource, SourceContext, UriKind, UriModel};
use crate::infrastructure::source::{FileDataSource, join_within_root};

/// Application assets, read from the context's asset root.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetUriModel;

impl AssetUriModel {
    /// Scheme prefix.
    pub const SCHEME: &'static str = "asset://";

    /// Prefixes an asset name with the scheme; already-prefixed names pass
    /// through unchanged.
    #[must_use]
    pub fn make_uri(asset_name: &str) -> Option<String> {
        if asset_name.is_empty() {
            return None;
        }
        if asset_name.starts_with(Self::SCHEME) {
            return Some(asset_name.to_string());
        }
        Some(format!("{}{asset_name}", Self::SCHEME))
    }
}

impl UriModel for AssetUriModel {
    fn kind(&self) -> UriKind {
        UriKind::Asset
    }

    fn schemes(&self) -> &'static [&'static str] {
        &[Self::SCHEME]
    }

    // The full URI, not the stripped name: "a.png" must not collide with
    // another family whose stripped content is also "a.png".
    fn disk_cache_key(&self, uri: &str) -> String {
        uri.to_string()
    }

    fn data_source(
        &self,
        context: &SourceContext,
        info: &UriInfo,
        _download: Option<&DownloadResult>,
    ) -> Result<Box<dyn DataSource>, SourceError> {
        let root = context
            .asset_root()
            .ok_or_else(|| SourceError::no_resolver("asset", info.uri()))?;
        let path = join_within_root(root, info.content())?;
        Ok(Box::new(FileDataSource::asset(path)))
    }
}
