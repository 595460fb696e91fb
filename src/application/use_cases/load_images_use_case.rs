//! Load a batch of URIs through the display pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::application::dto::LoadReport;
use crate::application::services::DisplayService;
use crate::domain::entities::{
    DisplayOptions, DisplayOutcome, DisplayRequest, DisplayRequestConfig, ImageSize, LoadedImage,
    TargetId,
};

/// Loads URIs concurrently, one target per URI, and reports each outcome.
#[derive(Clone)]
pub struct LoadImagesUseCase {
    service: Arc<DisplayService>,
    options: DisplayOptions,
}

impl LoadImagesUseCase {
    /// Creates the use case with default options for every request.
    #[must_use]
    pub fn new(service: Arc<DisplayService>, options: DisplayOptions) -> Self {
        Self { service, options }
    }

    /// Loads every URI and optionally writes decoded images into `out_dir`.
    pub async fn execute(
        &self,
        uris: &[String],
        target_size: Option<ImageSize>,
        out_dir: Option<&Path>,
    ) -> Vec<LoadReport> {
        let mut tickets = Vec::with_capacity(uris.len());
        for (index, uri) in uris.iter().enumerate() {
            let config = DisplayRequestConfig {
                image_uri: Some(uri.clone()),
                target: Some(TargetId(index as u64)),
                options: self.options.clone(),
                target_size,
                ..Default::default()
            };
            match DisplayRequest::new(config) {
                Ok(request) => tickets.push((uri.clone(), Some(self.service.display(request).await))),
                Err(e) => {
                    warn!(uri = %uri, error = %e, "Skipping invalid request");
                    tickets.push((uri.clone(), None));
                }
            }
        }

        let outcomes = join_all(tickets.into_iter().map(|(uri, ticket)| async move {
            match ticket {
                Some(ticket) => (uri, Some(ticket.outcome().await)),
                None => (uri, None),
            }
        }))
        .await;

        let mut reports = Vec::with_capacity(outcomes.len());
        for (index, (uri, outcome)) in outcomes.into_iter().enumerate() {
            let Some(outcome) = outcome else {
                reports.push(LoadReport::rejected(uri, "invalid request"));
                continue;
            };
            let mut report = LoadReport::new(uri, &outcome);
            if let (Some(dir), DisplayOutcome::Completed(image)) = (out_dir, &outcome) {
                match write_image(dir, index, image).await {
                    Ok(path) => report.output = Some(path.display().to_string()),
                    Err(e) => {
                        warn!(error = %e, "Failed to write decoded image");
                        report.reason = Some(e.to_string());
                    }
                }
            }
            reports.push(report);
        }
        reports
    }
}

async fn write_image(dir: &Path, index: usize, image: &LoadedImage) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{index:03}.png"));
    let pixels = Arc::clone(&image.image);
    let target = path.clone();
    tokio::task::spawn_blocking(move || {
        pixels
            .save_with_format(&target, image::ImageFormat::Png)
            .map_err(std::io::Error::other)
    })
    .await
    .map_err(std::io::Error::other)??;
    debug!(path = %path.display(), "Wrote decoded image");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::LoadStatus;
    use crate::application::services::{DisplayPorts, DisplayServiceConfig};
    use crate::domain::ports::SourceContext;
    use crate::infrastructure::binding::InMemoryTargetBinding;
    use crate::infrastructure::image::{
        DiskImageCache, DownloaderConfig, HttpImageDownloader, ImageCrateDecoder, MemoryImageCache,
    };
    use crate::infrastructure::uri::UriModelRegistry;
    use std::io::Cursor;
    use tempfile::TempDir;

    async fn service(dir: &Path) -> Arc<DisplayService> {
        let disk_cache = Arc::new(
            DiskImageCache::new(dir.join("cache"), 1024 * 1024)
                .await
                .unwrap(),
        );
        let downloader =
            HttpImageDownloader::new(&DownloaderConfig::default(), disk_cache.clone()).unwrap();
        let ports = DisplayPorts {
            resolver: Arc::new(UriModelRegistry::with_defaults()),
            context: SourceContext::new().with_asset_root(dir.join("assets")),
            memory_cache: Arc::new(MemoryImageCache::new(8)),
            disk_cache,
            downloader: Arc::new(downloader),
            decoder: Arc::new(ImageCrateDecoder),
            binding: Arc::new(InMemoryTargetBinding::new()),
        };
        Arc::new(DisplayService::new(ports, DisplayServiceConfig::default()))
    }

    #[tokio::test]
    async fn test_load_batch_writes_outputs() {
        let dir = TempDir::new().unwrap();
        let assets = dir.path().join("assets");
        std::fs::create_dir_all(&assets).unwrap();
        let mut png = Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(20, 10)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        std::fs::write(assets.join("a.png"), png.into_inner()).unwrap();

        let use_case = LoadImagesUseCase::new(service(dir.path()).await, DisplayOptions::default());
        let out = dir.path().join("out");
        let reports = use_case
            .execute(
                &["asset://a.png".to_string(), "asset://missing.png".to_string()],
                None,
                Some(&out),
            )
            .await;

        assert_eq!(reports[0].status, LoadStatus::Completed);
        assert_eq!(reports[0].size.as_deref(), Some("20x10"));
        assert!(out.join("000.png").exists());
        assert_eq!(reports[1].status, LoadStatus::Failed);
    }
}
