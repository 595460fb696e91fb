//! Data source adapters, one per kind of byte store.

pub mod file;
pub mod memory;
pub mod resolver;

pub use file::{FileDataSource, join_within_root};
pub use memory::ByteArrayDataSource;
pub use resolver::{
    AuthorityContentResolver, ContentDataSource, DirectoryResourceResolver, DrawableDataSource,
};
