//! Use case implementations.

mod load_images_use_case;
mod resolve_uri_use_case;

pub use load_images_use_case::LoadImagesUseCase;
pub use resolve_uri_use_case::ResolveUriUseCase;
