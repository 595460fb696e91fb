//! `http://` and `https://` models.

use crate::domain::entities::{DownloadPayload, DownloadResult, UriInfo};
use crate::domain::errors::SourceError;
use crate::domain::ports::{DataSource, SourceContext, UriKind, UriModel};
use crate::infrastructure::source::{ByteArrayDataSource, FileDataSource};

/// Plain HTTP images.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpUriModel;

impl HttpUriModel {
    /// Scheme prefix.
    pub const SCHEME: &'static str = "http://";
}

/// HTTPS images.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpsUriModel;

impl HttpsUriModel {
    /// Scheme prefix.
    pub const SCHEME: &'static str = "https://";
}

/// Wraps a finished download; network models never do I/O themselves.
fn download_source(
    info: &UriInfo,
    download: Option<&DownloadResult>,
) -> Result<Box<dyn DataSource>, SourceError> {
    let download = download.ok_or_else(|| SourceError::missing_download(info.uri()))?;
    Ok(match download.payload() {
        DownloadPayload::Bytes(bytes) => {
            Box::new(ByteArrayDataSource::new(bytes.clone(), download.from()))
        }
        DownloadPayload::DiskCache(path) => Box::new(FileDataSource::cached(
            path.clone(),
            download.len(),
            download.from(),
        )),
    })
}

impl UriModel for HttpUriModel {
    fn kind(&self) -> UriKind {
        UriKind::Network
    }

    fn schemes(&self) -> &'static [&'static str] {
        &[Self::SCHEME]
    }

    fn disk_cache_key(&self, uri: &str) -> String {
        uri.to_string()
    }

    fn is_from_net(&self) -> bool {
        true
    }

    fn data_source(
        &self,
        _context: &SourceContext,
        info: &UriInfo,
        download: Option<&DownloadResult>,
    ) -> Result<Box<dyn DataSource>, SourceError> {
        download_source(info, download)
    }
}

impl UriModel for HttpsUriModel {
    fn kind(&self) -> UriKind {
        UriKind::Network
    }

    fn schemes(&self) -> &'static [&'static str] {
        &[Self::SCHEME]
    }

    fn disk_cache_key(&self, uri: &str) -> String {
        uri.to_string()
    }

    fn is_from_net(&self) -> bool {
        true
    }

    fn data_source(
        &self,
        _context: &SourceContext,
        info: &UriInfo,
        download: Option<&DownloadResult>,
    ) -> Result<Box<dyn DataSource>, SourceError> {
        download_source(info, download)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ImageFrom;
    use bytes::Bytes;
    use std::sync::Arc;

    #[test]
    fn test_http_model() {
        let model = HttpUriModel;
        let uri = "http://site.com/i.png";
        assert!(model.matches(uri));
        assert!(!model.matches("https://site.com/i.png"));
        assert!(model.is_from_net());
        assert_eq!(model.uri_content(uri), "site.com/i.png");
        assert_eq!(model.disk_cache_key(uri), uri);
    }

    #[test]
    fn test_https_model() {
        let model = HttpsUriModel;
        assert!(model.matches("https://site.com/i.png"));
        assert!(!model.matches("http://site.com/i.png"));
    }

    #[test]
    fn test_data_source_requires_download() {
        let info = UriInfo::new("http://site.com/i.png", Arc::new(HttpUriModel));
        let err = HttpUriModel
            .data_source(&SourceContext::new(), &info, None)
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingDownloadResult { .. }));
    }

    #[test]
    fn test_data_source_wraps_download_bytes() {
        let info = UriInfo::new("https://site.com/i.png", Arc::new(HttpsUriModel));
        let download = DownloadResult::in_memory(Bytes::from_static(b"png"), ImageFrom::Network);
        let source = HttpsUriModel
            .data_source(&SourceContext::new(), &info, Some(&download))
            .unwrap();
        assert_eq!(source.read_all().unwrap(), b"png");
        assert_eq!(source.image_from(), ImageFrom::Network);
    }

    #[test]
    fn test_data_source_wraps_cache_file() {
        let info = UriInfo::new("http://site.com/i.png", Arc::new(HttpUriModel));
        let download = DownloadResult::persisted("/cache/x.img", 9, ImageFrom::DiskCache);
        let source = HttpUriModel
            .data_source(&SourceContext::new(), &info, Some(&download))
            .unwrap();
        assert_eq!(source.length(), Some(9));
        assert_eq!(source.image_from(), ImageFrom::DiskCache);
    }
}
