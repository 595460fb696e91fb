//! Inline base64 image models: `data:image/...;base64,` and `base64://`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

use crate::domain::entities::{DownloadResult, ImageFrom, UriInfo};
use crate::domain::errors::SourceError;
use crate::domain::ports::{DataSource, SourceContext, UriKind, UriModel, strip_scheme};
use crate::infrastructure::source::ByteArrayDataSource;

const BASE64_MARKER: &str = ";base64,";

/// `data:image/<type>;base64,<payload>` URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64UriModel;

impl Base64UriModel {
    /// Scheme prefix.
    pub const SCHEME: &'static str = "data:image/";
}

/// `base64://<payload>` URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64VariantUriModel;

impl Base64VariantUriModel {
    /// Scheme prefix.
    pub const SCHEME: &'static str = "base64://";
}

// Payloads are long, so the key is their digest. Both forms of the same
// payload share a key.
fn payload_key(payload: &str) -> String {
    let digest = Sha256::digest(payload.trim().as_bytes());
    format!("base64-sha256:{}", hex::encode(digest))
}

fn decode_payload(info: &UriInfo) -> Result<Box<dyn DataSource>, SourceError> {
    let bytes = STANDARD
        .decode(info.content().trim())
        .map_err(|e| SourceError::InvalidBase64 {
            uri: info.disk_cache_key().to_string(),
            message: e.to_string(),
        })?;
    Ok(Box::new(ByteArrayDataSource::new(bytes, ImageFrom::Memory)))
}

impl UriModel for Base64UriModel {
    fn kind(&self) -> UriKind {
        UriKind::Base64
    }

    fn schemes(&self) -> &'static [&'static str] {
        &[Self::SCHEME]
    }

    fn uri_content(&self, uri: &str) -> String {
        match strip_scheme(uri, self.schemes()) {
            Some(rest) => rest
                .split_once(BASE64_MARKER)
                .map_or(rest, |(_, payload)| payload)
                .to_string(),
            None => uri.to_string(),
        }
    }

    fn disk_cache_key(&self, uri: &str) -> String {
        payload_key(&self.uri_content(uri))
    }

    fn data_source(
        &self,
        _context: &SourceContext,
        info: &UriInfo,
        _download: Option<&DownloadResult>,
    ) -> Result<Box<dyn DataSource>, SourceError> {
        decode_payload(info)
    }
}

impl UriModel for Base64VariantUriModel {
    fn kind(&self) -> UriKind {
        UriKind::Base64
    }

    fn schemes(&self) -> &'static [&'static str] {
        &[Self::SCHEME]
    }

    fn disk_cache_key(&self, uri: &str) -> String {
        payload_key(&self.uri_content(uri))
    }

    fn data_source(
        &self,
        _context: &SourceContext,
        info: &UriInfo,
        _download: Option<&DownloadResult>,
    ) -> Result<Box<dyn DataSource>, SourceError> {
        decode_payload(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const PAYLOAD: &str = "aGVsbG8=";

    #[test]
    fn test_data_uri_content() {
        let uri = format!("data:image/png;base64,{PAYLOAD}");
        assert!(Base64UriModel.matches(&uri));
        assert_eq!(Base64UriModel.uri_content(&uri), PAYLOAD);
    }

    #[test]
    fn test_both_forms_share_key() {
        let data = format!("data:image/png;base64,{PAYLOAD}");
        let variant = format!("base64://{PAYLOAD}");
        assert_eq!(
            Base64UriModel.disk_cache_key(&data),
            Base64VariantUriModel.disk_cache_key(&variant)
        );
        assert!(Base64UriModel.disk_cache_key(&data).starts_with("base64-sha256:"));
    }

    #[test]
    fn test_distinct_payloads_distinct_keys() {
        assert_ne!(
            Base64VariantUriModel.disk_cache_key("base64://AAAA"),
            Base64VariantUriModel.disk_cache_key("base64://AAAB")
        );
    }

    #[test]
    fn test_decodes_payload() {
        let info = UriInfo::new(format!("base64://{PAYLOAD}"), Arc::new(Base64VariantUriModel));
        let source = Base64VariantUriModel
            .data_source(&SourceContext::new(), &info, None)
            .unwrap();
        assert_eq!(source.read_all().unwrap(), b"hello");
        assert_eq!(source.image_from(), ImageFrom::Memory);
    }

    #[test]
    fn test_invalid_payload() {
        let info = UriInfo::new("base64://!!!", Arc::new(Base64VariantUriModel));
        let err = Base64VariantUriModel
            .data_source(&SourceContext::new(), &info, None)
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidBase64 { .. }));
    }
}
