mod data_source_port;
mod image_cache_port;
mod listener_port;
mod target_binding_port;
mod uri_model_port;

pub use data_source_port::{
    ByteStream, ContentResolver, DataSource, ResourceResolver, SourceContext,
};
pub use image_cache_port::{
    CacheError, CacheResult, DiskCachePort, ImageCachePort, ImageDecoderPort, ImageDownloaderPort,
};
pub use listener_port::DisplayListener;
pub use target_binding_port::TargetBinding;
pub use uri_model_port::{UriKind, UriModel, UriResolver, strip_scheme};

#[cfg(test)]
pub mod mocks {
    pub use super::listener_port::MockDisplayListener;
}
