//! Dispatcher that drives display requests through the load pipeline.
//!
//! Each request runs as its own task: resolve, memory cache, disk cache or
//! download, data source, decode, memory cache store. A semaphore bounds
//! how many requests execute at once.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, trace, warn};

use crate::domain::entities::{
    CancelCause, DisplayOutcome, DisplayRequest, DownloadResult, ImageFrom, LoadedImage,
    MemoryCacheKey, RequestId, RequestLevel, RequestState, TargetId, UriInfo,
};
use crate::domain::errors::{DeliveryError, DisplayError, SourceError, UriError};
use crate::domain::ports::{
    CacheError, DiskCachePort, ImageCachePort, ImageDecoderPort, ImageDownloaderPort,
    SourceContext, TargetBinding, UriResolver,
};

use super::request_handle::{DisplayTicket, RequestHandle};

/// Configuration for [`DisplayService`].
#[derive(Debug, Clone)]
pub struct DisplayServiceConfig {
    /// Maximum requests executing at once.
    pub max_concurrent_requests: usize,
}

impl Default for DisplayServiceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 8,
        }
    }
}

/// Collaborators the pipeline runs against.
#[derive(Clone)]
pub struct DisplayPorts {
    /// Maps URI strings to models.
    pub resolver: Arc<dyn UriResolver>,
    /// Context handed to `UriModel::data_source`.
    pub context: SourceContext,
    /// Decoded image cache.
    pub memory_cache: Arc<dyn ImageCachePort>,
    /// Downloaded byte cache.
    pub disk_cache: Arc<dyn DiskCachePort>,
    /// Network fetcher.
    pub downloader: Arc<dyn ImageDownloaderPort>,
    /// Byte decoder.
    pub decoder: Arc<dyn ImageDecoderPort>,
    /// Target to request relation.
    pub binding: Arc<dyn TargetBinding>,
}

type ActiveRequests = Arc<RwLock<HashMap<RequestId, Arc<RequestHandle>>>>;

/// Handle bound to each target. Rebinding and committing a terminal state
/// both happen under this lock, so a request either settles while still
/// bound or is superseded first.
type BoundTargets = Arc<Mutex<HashMap<TargetId, Arc<RequestHandle>>>>;

/// Entry point for displaying images into targets.
pub struct DisplayService {
    ports: Arc<DisplayPorts>,
    active: ActiveRequests,
    bound: BoundTargets,
    permits: Arc<Semaphore>,
    shutting_down: AtomicBool,
    config: DisplayServiceConfig,
}

impl std::fmt::Debug for DisplayService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayService")
            .field("config", &self.config)
            .field("shutting_down", &self.shutting_down.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl DisplayService {
    /// Creates a dispatcher over `ports`.
    #[must_use]
    pub fn new(ports: DisplayPorts, config: DisplayServiceConfig) -> Self {
        Self {
            ports: Arc::new(ports),
            active: Arc::new(RwLock::new(HashMap::new())),
            bound: Arc::new(Mutex::new(HashMap::new())),
            permits: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            shutting_down: AtomicBool::new(false),
            config,
        }
    }

    /// Resolves a URI without loading it.
    ///
    /// # Errors
    /// Returns [`DisplayError::Unresolved`] if no model accepts `uri`.
    pub fn resolve(&self, uri: &str) -> Result<UriInfo, DisplayError> {
        Ok(self.ports.resolver.resolve(uri)?)
    }

    /// Submits a request and returns its ticket.
    ///
    /// A request bound to a target that already has one in flight replaces
    /// it; the older request is delivered `Cancelled(Replaced)` before this
    /// one starts resolving.
    pub async fn display(&self, request: DisplayRequest) -> DisplayTicket {
        let request = Arc::new(request);
        let (handle, ticket) = RequestHandle::new(Arc::clone(&request));
        let id = request.id();
        let target = request.target();

        if self.shutting_down.load(Ordering::Acquire) {
            debug!(id = %id, "Rejecting request after shutdown");
            handle.cancel(CancelCause::Shutdown);
            return ticket;
        }

        self.active.write().await.insert(id, Arc::clone(&handle));

        let superseded = {
            let mut bound = self.bound.lock();
            let previous = self.ports.binding.rebind(target, id);
            bound
                .insert(target, Arc::clone(&handle))
                .filter(|stale| previous == Some(stale.request().id()) && stale.supersede())
        };
        if let Some(stale) = superseded {
            stale.deliver(DisplayOutcome::Cancelled(CancelCause::Replaced));
            debug!(id = %stale.request().id(), target = %target, "Replaced by newer request");
        }

        let task = DisplayTask {
            ports: Arc::clone(&self.ports),
            active: Arc::clone(&self.active),
            bound: Arc::clone(&self.bound),
            permits: Arc::clone(&self.permits),
            handle,
        };
        tokio::spawn(task.run());

        ticket
    }

    /// Cancels a request by id. Returns false if it is not in flight.
    pub async fn cancel(&self, id: RequestId) -> bool {
        let handle = self.active.read().await.get(&id).cloned();
        match handle {
            Some(handle) => {
                handle.cancel(CancelCause::Requested);
                debug!(id = %id, "Cancelled display request");
                true
            }
            None => false,
        }
    }

    /// Cancels whatever request is bound to `target`.
    pub async fn cancel_target(&self, target: TargetId) -> bool {
        match self.ports.binding.bound_request(target) {
            Some(id) => self.cancel(id).await,
            None => false,
        }
    }

    /// Cancels every request in flight. Returns how many were signalled.
    pub async fn cancel_all(&self) -> usize {
        self.cancel_active(CancelCause::Requested).await
    }

    /// Cancels everything and rejects later submissions.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        let count = self.cancel_active(CancelCause::Shutdown).await;
        self.permits.close();
        info!(cancelled = count, "Display service shut down");
    }

    /// Returns true if `id` is still in flight.
    pub async fn is_loading(&self, id: RequestId) -> bool {
        self.active.read().await.contains_key(&id)
    }

    /// Returns the number of requests in flight.
    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    async fn cancel_active(&self, cause: CancelCause) -> usize {
        let handles: Vec<_> = self.active.read().await.values().cloned().collect();
        for handle in &handles {
            handle.cancel(cause);
        }
        if !handles.is_empty() {
            debug!(count = handles.len(), cause = %cause, "Cancelled active display requests");
        }
        handles.len()
    }
}

/// Why the pipeline stopped before producing an image.
enum Halt {
    Fail(DisplayError),
    Cancel(CancelCause),
    Stopped(DeliveryError),
}

impl From<UriError> for Halt {
    fn from(err: UriError) -> Self {
        Self::Fail(err.into())
    }
}

impl From<SourceError> for Halt {
    fn from(err: SourceError) -> Self {
        Self::Fail(err.into())
    }
}

impl From<CacheError> for Halt {
    fn from(err: CacheError) -> Self {
        Self::Fail(err.into())
    }
}

struct DisplayTask {
    ports: Arc<DisplayPorts>,
    active: ActiveRequests,
    bound: BoundTargets,
    permits: Arc<Semaphore>,
    handle: Arc<RequestHandle>,
}

impl DisplayTask {
    async fn run(self) {
        let request = Arc::clone(self.handle.request());
        let id = request.id();

        let delivered = match self.execute(&request).await {
            Ok(image) => {
                let (from, size) = (image.from, image.size());
                self.commit(DisplayOutcome::Completed(image)).inspect(|_| {
                    info!(id = %id, from = %from, size = %size, "Image displayed");
                })
            }
            Err(Halt::Fail(error)) => {
                warn!(id = %id, uri = %request.uri(), error = %error, "Display request failed");
                self.commit(DisplayOutcome::Failed(error))
            }
            Err(Halt::Cancel(cause)) => {
                debug!(id = %id, cause = %cause, "Display request cancelled");
                self.commit(DisplayOutcome::Cancelled(cause))
            }
            Err(Halt::Stopped(err)) => Err(err),
        };
        if let Err(err) = delivered {
            trace!(id = %id, reason = %err, "Outcome not delivered");
        }

        self.active.write().await.remove(&id);
        let target = request.target();
        let mut bound = self.bound.lock();
        if bound
            .get(&target)
            .is_some_and(|handle| handle.request().id() == id)
        {
            bound.remove(&target);
        }
        self.ports.binding.release(target, id);
    }

    fn commit(&self, outcome: DisplayOutcome) -> Result<(), DeliveryError> {
        let settled = {
            let _bound = self.bound.lock();
            self.handle.settle(outcome.state())
        };
        settled?;
        self.handle.deliver(outcome);
        Ok(())
    }

    fn advance(&self, next: RequestState) -> Result<(), Halt> {
        self.handle.transition(next).map_err(Halt::Stopped)
    }

    fn checkpoint(&self, request: &DisplayRequest) -> Result<(), Halt> {
        if let Some(cause) = self.handle.checkpoint() {
            return Err(Halt::Cancel(cause));
        }
        if !self.ports.binding.is_current(request.target(), request.id()) {
            return Err(Halt::Cancel(CancelCause::Replaced));
        }
        Ok(())
    }

    async fn execute(&self, request: &DisplayRequest) -> Result<LoadedImage, Halt> {
        let options = request.options();
        self.advance(RequestState::Resolving)?;

        let info = request.attach_uri_info(self.ports.resolver.resolve(request.uri())?);
        trace!(id = %request.id(), kind = %info.kind(), key = %info.disk_cache_key(), "Resolved uri");

        let memory_key = MemoryCacheKey::new(info.disk_cache_key(), request.effective_resize());

        if options.cache_in_memory
            && let Some(image) = self.ports.memory_cache.get(&memory_key).await
        {
            self.checkpoint(request)?;
            self.advance(RequestState::Executing)?;
            return Ok(LoadedImage {
                key: memory_key,
                image,
                from: ImageFrom::MemoryCache,
            });
        }
        if options.request_level == RequestLevel::Memory {
            return Err(Halt::Cancel(CancelCause::RequestLevelIsMemory));
        }

        self.advance(RequestState::Queued)?;
        let _permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return Err(Halt::Cancel(CancelCause::Shutdown)),
        };
        self.advance(RequestState::Executing)?;

        let download = if info.is_from_net() {
            let download = self.fetch(request, info).await?;
            self.checkpoint(request)?;
            Some(download)
        } else {
            None
        };

        let source = info
            .model()
            .data_source(&self.ports.context, info, download.as_ref())?;
        let from = source.image_from();
        let decoder = Arc::clone(&self.ports.decoder);
        let resize = request.effective_resize();
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(source.as_ref(), resize))
            .await
            .map_err(|e| CacheError::DecodeError(format!("Decode task panicked: {e}")))??;
        self.checkpoint(request)?;

        let image = Arc::new(decoded);
        if options.cache_in_memory {
            self.ports
                .memory_cache
                .put(memory_key.clone(), Arc::clone(&image))
                .await;
        }

        Ok(LoadedImage {
            key: memory_key,
            image,
            from,
        })
    }

    /// Disk cache first, then the network unless the level forbids it.
    async fn fetch(&self, request: &DisplayRequest, info: &UriInfo) -> Result<DownloadResult, Halt> {
        let options = request.options();
        let key = info.disk_cache_key();

        if options.cache_in_disk
            && let Some(path) = self.ports.disk_cache.get_path(key).await
        {
            match tokio::fs::metadata(&path).await {
                Ok(meta) => {
                    trace!(id = %request.id(), path = %path.display(), "Disk cache hit");
                    return Ok(DownloadResult::persisted(path, meta.len(), ImageFrom::DiskCache));
                }
                Err(e) => {
                    debug!(
                        id = %request.id(),
                        path = %path.display(),
                        error = %e,
                        "Disk cache entry unreadable, treating as miss"
                    );
                }
            }
        }
        self.checkpoint(request)?;

        if options.request_level == RequestLevel::Local {
            return Err(Halt::Cancel(CancelCause::RequestLevelIsLocal));
        }

        Ok(self
            .ports
            .downloader
            .download(info, options.cache_in_disk)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DisplayRequestConfig, ImageSize};
    use crate::domain::ports::{CacheResult, DisplayListener};
    use crate::infrastructure::binding::InMemoryTargetBinding;
    use crate::infrastructure::image::{DiskImageCache, ImageCrateDecoder, MemoryImageCache};
    use crate::infrastructure::uri::UriModelRegistry;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::io::Cursor;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[derive(Default)]
    struct FakeDownloader {
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait::async_trait]
    impl ImageDownloaderPort for FakeDownloader {
        async fn download(&self, _info: &UriInfo, _persist: bool) -> CacheResult<DownloadResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(DownloadResult::in_memory(
                Bytes::from(png_bytes(16, 16)),
                ImageFrom::Network,
            ))
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<String>>,
    }

    impl RecordingListener {
        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl DisplayListener for RecordingListener {
        fn on_started(&self, _request: &DisplayRequest) {
            self.events.lock().push("started".to_string());
        }
        fn on_completed(&self, _request: &DisplayRequest, image: &LoadedImage) {
            self.events.lock().push(format!("completed:{}", image.from));
        }
        fn on_failed(&self, _request: &DisplayRequest, _error: &DisplayError) {
            self.events.lock().push("failed".to_string());
        }
        fn on_cancelled(&self, _request: &DisplayRequest, cause: CancelCause) {
            self.events.lock().push(format!("cancelled:{cause:?}"));
        }
    }

    struct Fixture {
        service: DisplayService,
        downloader: Arc<FakeDownloader>,
        disk_cache: Arc<DiskImageCache>,
        _dir: TempDir,
    }

    async fn fixture(gate: Option<Arc<Notify>>) -> Fixture {
        fixture_with(gate, |_| {}).await
    }

    async fn fixture_with(
        gate: Option<Arc<Notify>>,
        customize: impl FnOnce(&mut DisplayPorts),
    ) -> Fixture {
        let dir = TempDir::new().unwrap();
        let assets = dir.path().join("assets");
        std::fs::create_dir_all(&assets).unwrap();
        std::fs::write(assets.join("logo.png"), png_bytes(32, 16)).unwrap();

        let disk_cache = Arc::new(
            DiskImageCache::new(dir.path().join("cache"), 1024 * 1024)
                .await
                .unwrap(),
        );
        let downloader = Arc::new(FakeDownloader {
            calls: AtomicUsize::new(0),
            gate,
        });
        let mut ports = DisplayPorts {
            resolver: Arc::new(UriModelRegistry::with_defaults()),
            context: SourceContext::new().with_asset_root(assets),
            memory_cache: Arc::new(MemoryImageCache::new(16)),
            disk_cache: disk_cache.clone(),
            downloader: downloader.clone(),
            decoder: Arc::new(ImageCrateDecoder),
            binding: Arc::new(InMemoryTargetBinding::new()),
        };
        customize(&mut ports);
        Fixture {
            service: DisplayService::new(ports, DisplayServiceConfig::default()),
            downloader,
            disk_cache,
            _dir: dir,
        }
    }

    fn request(uri: &str, target: u64, listener: Option<Arc<RecordingListener>>) -> DisplayRequest {
        DisplayRequest::new(DisplayRequestConfig {
            image_uri: Some(uri.to_string()),
            target: Some(TargetId(target)),
            listener: listener.map(|l| l as Arc<dyn DisplayListener>),
            ..Default::default()
        })
        .unwrap()
    }

    fn request_with(uri: &str, target: u64, listener: Arc<dyn DisplayListener>) -> DisplayRequest {
        DisplayRequest::new(DisplayRequestConfig {
            image_uri: Some(uri.to_string()),
            target: Some(TargetId(target)),
            listener: Some(listener),
            ..Default::default()
        })
        .unwrap()
    }

    /// Memory cache whose first lookup parks until released.
    #[derive(Default)]
    struct ParkingMemoryCache {
        inner: MemoryImageCache,
        armed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl ImageCachePort for ParkingMemoryCache {
        async fn get(&self, key: &MemoryCacheKey) -> Option<Arc<image::DynamicImage>> {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.get(key).await
        }

        async fn put(&self, key: MemoryCacheKey, image: Arc<image::DynamicImage>) {
            self.inner.put(key, image).await;
        }

        async fn evict(&self, key: &MemoryCacheKey) {
            self.inner.evict(key).await;
        }

        fn len(&self) -> usize {
            self.inner.len()
        }

        async fn clear(&self) {
            self.inner.clear().await;
        }
    }

    /// Binding that, once armed, lets the parked lookup go right after the
    /// swap and then stalls before returning.
    struct StallingBinding {
        inner: InMemoryTargetBinding,
        armed: AtomicBool,
        cache: Arc<ParkingMemoryCache>,
    }

    impl TargetBinding for StallingBinding {
        fn bound_request(&self, target: TargetId) -> Option<RequestId> {
            self.inner.bound_request(target)
        }

        fn rebind(&self, target: TargetId, request: RequestId) -> Option<RequestId> {
            let previous = self.inner.rebind(target, request);
            if self.armed.swap(false, Ordering::SeqCst) {
                self.cache.release.notify_one();
                std::thread::sleep(Duration::from_millis(150));
            }
            previous
        }

        fn release(&self, target: TargetId, request: RequestId) -> bool {
            self.inner.release(target, request)
        }
    }

    /// Disk cache that reports a file which is already gone.
    struct VanishedDiskCache {
        path: std::path::PathBuf,
    }

    #[async_trait::async_trait]
    impl DiskCachePort for VanishedDiskCache {
        async fn get_path(&self, _key: &str) -> Option<std::path::PathBuf> {
            Some(self.path.clone())
        }

        async fn get_bytes(&self, _key: &str) -> Option<Vec<u8>> {
            None
        }

        async fn put_bytes(&self, _key: &str, _bytes: &[u8]) -> CacheResult<std::path::PathBuf> {
            Err(CacheError::IoError("read only".to_string()))
        }

        async fn contains(&self, _key: &str) -> bool {
            true
        }

        async fn evict(&self, _key: &str) {}

        async fn clear(&self) -> CacheResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingListener {
        started: Mutex<HashMap<RequestId, usize>>,
        terminal: Mutex<HashMap<RequestId, usize>>,
    }

    impl CountingListener {
        fn terminal(&self, request: &DisplayRequest) {
            *self.terminal.lock().entry(request.id()).or_default() += 1;
        }
    }

    impl DisplayListener for CountingListener {
        fn on_started(&self, request: &DisplayRequest) {
            *self.started.lock().entry(request.id()).or_default() += 1;
        }
        fn on_completed(&self, request: &DisplayRequest, _image: &LoadedImage) {
            self.terminal(request);
        }
        fn on_failed(&self, request: &DisplayRequest, _error: &DisplayError) {
            self.terminal(request);
        }
        fn on_cancelled(&self, request: &DisplayRequest, _cause: CancelCause) {
            self.terminal(request);
        }
    }

    async fn wait_idle(service: &DisplayService) {
        for _ in 0..200 {
            if service.active_count().await == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("requests still active");
    }

    #[tokio::test]
    async fn test_asset_then_memory_cache() {
        let fx = fixture(None).await;
        let listener = Arc::new(RecordingListener::default());

        let ticket = fx
            .service
            .display(request("asset://logo.png", 1, Some(listener.clone())))
            .await;
        match ticket.outcome().await {
            DisplayOutcome::Completed(image) => {
                assert_eq!(image.from, ImageFrom::Asset);
                assert_eq!(image.size(), ImageSize::new(32, 16));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(listener.events(), vec!["started", "completed:asset"]);

        let again = fx.service.display(request("asset://logo.png", 2, None)).await;
        match again.outcome().await {
            DisplayOutcome::Completed(image) => assert_eq!(image.from, ImageFrom::MemoryCache),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unresolved_uri_fails_without_starting() {
        let fx = fixture(None).await;
        let listener = Arc::new(RecordingListener::default());

        let ticket = fx
            .service
            .display(request("ftp://host/a.png", 1, Some(listener.clone())))
            .await;
        assert!(matches!(
            ticket.outcome().await,
            DisplayOutcome::Failed(DisplayError::Unresolved(UriError::Unresolved { .. }))
        ));
        assert_eq!(listener.events(), vec!["failed"]);
    }

    #[tokio::test]
    async fn test_network_download() {
        let fx = fixture(None).await;
        let ticket = fx
            .service
            .display(request("https://img.example.com/a.png", 1, None))
            .await;
        match ticket.outcome().await {
            DisplayOutcome::Completed(image) => assert_eq!(image.from, ImageFrom::Network),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fx.downloader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disk_cache_hit_skips_download() {
        let fx = fixture(None).await;
        let uri = "http://img.example.com/cached.png";
        fx.disk_cache.put_bytes(uri, &png_bytes(8, 8)).await.unwrap();

        let ticket = fx.service.display(request(uri, 1, None)).await;
        match ticket.outcome().await {
            DisplayOutcome::Completed(image) => assert_eq!(image.from, ImageFrom::DiskCache),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fx.downloader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_local_level_skips_download() {
        let fx = fixture(None).await;
        let mut req = DisplayRequestConfig {
            image_uri: Some("https://img.example.com/a.png".to_string()),
            target: Some(TargetId(1)),
            ..Default::default()
        };
        req.options.request_level = RequestLevel::Local;

        let ticket = fx.service.display(DisplayRequest::new(req).unwrap()).await;
        assert!(matches!(
            ticket.outcome().await,
            DisplayOutcome::Cancelled(CancelCause::RequestLevelIsLocal)
        ));
        assert_eq!(fx.downloader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_memory_level_miss() {
        let fx = fixture(None).await;
        let mut req = DisplayRequestConfig {
            image_uri: Some("asset://logo.png".to_string()),
            target: Some(TargetId(1)),
            ..Default::default()
        };
        req.options.request_level = RequestLevel::Memory;

        let ticket = fx.service.display(DisplayRequest::new(req).unwrap()).await;
        assert!(matches!(
            ticket.outcome().await,
            DisplayOutcome::Cancelled(CancelCause::RequestLevelIsMemory)
        ));
    }

    #[tokio::test]
    async fn test_rebind_cancels_stale_request() {
        let gate = Arc::new(Notify::new());
        let fx = fixture(Some(gate.clone())).await;
        let stale_listener = Arc::new(RecordingListener::default());

        let mut stale = fx
            .service
            .display(request(
                "https://img.example.com/slow.png",
                5,
                Some(stale_listener.clone()),
            ))
            .await;
        stale.wait_started().await;

        let fresh = fx.service.display(request("asset://logo.png", 5, None)).await;
        assert!(matches!(
            stale.outcome().await,
            DisplayOutcome::Cancelled(CancelCause::Replaced)
        ));
        assert!(fresh.outcome().await.is_completed());

        gate.notify_one();
        wait_idle(&fx.service).await;
        assert_eq!(stale_listener.events(), vec!["started", "cancelled:Replaced"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_each_get_one_outcome() {
        let fx = fixture(None).await;
        let listener = Arc::new(CountingListener::default());
        let uris = ["asset://logo.png", "https://img.example.com/a.png", "ftp://nowhere/a.png"];

        let submissions = (0..24u64).map(|target| {
            let uri = uris[usize::try_from(target).unwrap() % uris.len()];
            fx.service
                .display(request_with(uri, target, listener.clone()))
        });
        let tickets = futures_util::future::join_all(submissions).await;
        let ids: Vec<RequestId> = tickets.iter().map(DisplayTicket::id).collect();

        let mut completed = 0;
        let mut failed = 0;
        for ticket in tickets {
            match ticket.outcome().await {
                DisplayOutcome::Completed(_) => completed += 1,
                DisplayOutcome::Failed(_) => failed += 1,
                DisplayOutcome::Cancelled(cause) => panic!("unexpected cancel: {cause}"),
            }
        }
        wait_idle(&fx.service).await;

        assert_eq!((completed, failed), (16, 8));
        let terminal = listener.terminal.lock();
        assert_eq!(terminal.len(), ids.len());
        assert!(ids.iter().all(|id| terminal.get(id) == Some(&1)));
        let started = listener.started.lock();
        assert!(started.values().all(|count| *count == 1));
        assert!(started.keys().all(|id| terminal.contains_key(id)));
        assert_eq!(started.len(), 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rebind_during_memory_hit_suppresses_stale_completion() {
        let cache = Arc::new(ParkingMemoryCache::default());
        let binding = Arc::new(StallingBinding {
            inner: InMemoryTargetBinding::new(),
            armed: AtomicBool::new(false),
            cache: Arc::clone(&cache),
        });
        let key = MemoryCacheKey::new("asset://logo.png", None);
        cache
            .inner
            .put(key, Arc::new(image::DynamicImage::new_rgb8(4, 4)))
            .await;

        let fx = fixture_with(None, |ports| {
            ports.memory_cache = cache.clone();
            ports.binding = binding.clone();
        })
        .await;
        let stale_listener = Arc::new(RecordingListener::default());

        cache.armed.store(true, Ordering::SeqCst);
        let stale = fx
            .service
            .display(request("asset://logo.png", 7, Some(stale_listener.clone())))
            .await;
        cache.entered.notified().await;

        binding.armed.store(true, Ordering::SeqCst);
        let fresh = fx.service.display(request("asset://logo.png", 7, None)).await;

        assert!(matches!(
            stale.outcome().await,
            DisplayOutcome::Cancelled(CancelCause::Replaced)
        ));
        match fresh.outcome().await {
            DisplayOutcome::Completed(image) => assert_eq!(image.from, ImageFrom::MemoryCache),
            other => panic!("unexpected outcome: {other:?}"),
        }
        wait_idle(&fx.service).await;
        assert_eq!(stale_listener.events(), vec!["cancelled:Replaced"]);
        assert!(binding.bound_request(TargetId(7)).is_none());
    }

    #[tokio::test]
    async fn test_unreadable_disk_entry_falls_back_to_download() {
        let fx = fixture_with(None, |ports| {
            ports.disk_cache = Arc::new(VanishedDiskCache {
                path: std::env::temp_dir().join("sketch-missing-entry.img"),
            });
        })
        .await;

        let ticket = fx
            .service
            .display(request("https://img.example.com/gone.png", 1, None))
            .await;
        match ticket.outcome().await {
            DisplayOutcome::Completed(image) => assert_eq!(image.from, ImageFrom::Network),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fx.downloader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_executing_request() {
        let gate = Arc::new(Notify::new());
        let fx = fixture(Some(gate.clone())).await;

        let mut ticket = fx
            .service
            .display(request("https://img.example.com/slow.png", 1, None))
            .await;
        ticket.wait_started().await;
        assert!(fx.service.cancel(ticket.id()).await);

        gate.notify_one();
        assert!(matches!(
            ticket.outcome().await,
            DisplayOutcome::Cancelled(CancelCause::Requested)
        ));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_requests() {
        let fx = fixture(None).await;
        fx.service.shutdown().await;

        let ticket = fx.service.display(request("asset://logo.png", 1, None)).await;
        assert!(matches!(
            ticket.outcome().await,
            DisplayOutcome::Cancelled(CancelCause::Shutdown)
        ));
        assert!(!fx.service.cancel_target(TargetId(1)).await);
    }
}
