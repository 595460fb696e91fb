//! URI models for each supported scheme family, and their registry.

pub mod asset;
pub mod content;
pub mod drawable;
pub mod file;
pub mod inline;
pub mod network;
pub mod registry;

pub use asset::AssetUriModel;
pub use content::ContentUriModel;
pub use drawable::DrawableUriModel;
pub use file::{FileUriModel, FileVariantUriModel};
pub use inline::{Base64UriModel, Base64VariantUriModel};
pub use network::{HttpUriModel, HttpsUriModel};
pub use registry::{
    UnmatchedUriPolicy, UriModelRegistry, UriModelRegistryBuilder, global, install_global,
};
