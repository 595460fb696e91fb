//! Resolve URIs without loading them.

use std::sync::Arc;

use tracing::debug;

use crate::application::dto::ResolvedUri;
use crate::domain::errors::UriError;
use crate::domain::ports::UriResolver;

/// Resolves URI strings into their model-derived fields.
#[derive(Clone)]
pub struct ResolveUriUseCase {
    resolver: Arc<dyn UriResolver>,
}

impl ResolveUriUseCase {
    /// Creates the use case.
    #[must_use]
    pub fn new(resolver: Arc<dyn UriResolver>) -> Self {
        Self { resolver }
    }

    /// Resolves one URI.
    ///
    /// # Errors
    /// Returns [`UriError::Unresolved`] if no model accepts `uri`.
    pub fn execute(&self, uri: &str) -> Result<ResolvedUri, UriError> {
        let info = self.resolver.resolve(uri)?;
        debug!(uri = %uri, kind = %info.kind(), "Resolved uri");
        Ok(ResolvedUri::from(&info))
    }

    /// Resolves every URI, keeping per-URI failures.
    pub fn execute_all<'a, I>(&self, uris: I) -> Vec<(String, Result<ResolvedUri, UriError>)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        uris.into_iter()
            .map(|uri| (uri.to_string(), self.execute(uri)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::uri::{UnmatchedUriPolicy, UriModelRegistry};

    #[test]
    fn test_resolve_file_variants_share_key() {
        let use_case = ResolveUriUseCase::new(Arc::new(UriModelRegistry::with_defaults()));
        let plain = use_case.execute("/sdcard/a.png").unwrap();
        let variant = use_case.execute("file:///sdcard/a.png").unwrap();
        assert_eq!(plain.disk_cache_key, variant.disk_cache_key);
        assert_eq!(plain.kind, "file");
    }

    #[test]
    fn test_execute_all_keeps_failures() {
        let use_case = ResolveUriUseCase::new(Arc::new(UriModelRegistry::with_defaults()));
        let results = use_case.execute_all(["asset://a.png", "relative.png"]);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(UriError::Unresolved { .. })));
    }

    #[test]
    fn test_file_path_fallback_policy() {
        let registry = UriModelRegistry::builder()
            .with_defaults()
            .unmatched(UnmatchedUriPolicy::TreatAsFilePath)
            .build()
            .unwrap();
        let use_case = ResolveUriUseCase::new(Arc::new(registry));
        assert_eq!(use_case.execute("relative.png").unwrap().kind, "file");
    }
}
