//! Data sources that go through a resolver, and directory-backed resolvers.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::entities::ImageFrom;
use crate::domain::errors::SourceError;
use crate::domain::ports::{ByteStream, ContentResolver, DataSource, ResourceResolver};

use super::file::join_within_root;

const CONTENT_SCHEME: &str = "content://";
const DRAWABLE_EXTENSIONS: [&str; 4] = ["png", "webp", "jpg", "jpeg"];

/// Reads an embedded drawable through a [`ResourceResolver`].
pub struct DrawableDataSource {
    resolver: Arc<dyn ResourceResolver>,
    id: String,
}

impl DrawableDataSource {
    /// Creates a source for resource `id`.
    #[must_use]
    pub fn new(resolver: Arc<dyn ResourceResolver>, id: impl Into<String>) -> Self {
        Self {
            resolver,
            id: id.into(),
        }
    }
}

impl fmt::Debug for DrawableDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawableDataSource")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl DataSource for DrawableDataSource {
    fn open(&self) -> Result<ByteStream, SourceError> {
        self.resolver.open_drawable(&self.id)
    }

    fn length(&self) -> Option<u64> {
        self.resolver.drawable_length(&self.id)
    }

    fn image_from(&self) -> ImageFrom {
        ImageFrom::Drawable
    }

    fn location(&self) -> String {
        format!("drawable {}", self.id)
    }
}

/// Reads a `content://` URI through a [`ContentResolver`].
pub struct ContentDataSource {
    resolver: Arc<dyn ContentResolver>,
    uri: String,
}

impl ContentDataSource {
    /// Creates a source for `uri`.
    #[must_use]
    pub fn new(resolver: Arc<dyn ContentResolver>, uri: impl Into<String>) -> Self {
        Self {
            resolver,
            uri: uri.into(),
        }
    }
}

impl fmt::Debug for ContentDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentDataSource")
            .field("uri", &self.uri)
            .finish_non_exhaustive()
    }
}

impl DataSource for ContentDataSource {
    fn open(&self) -> Result<ByteStream, SourceError> {
        self.resolver.open(&self.uri)
    }

    fn length(&self) -> Option<u64> {
        self.resolver.length(&self.uri)
    }

    fn image_from(&self) -> ImageFrom {
        ImageFrom::Content
    }

    fn location(&self) -> String {
        self.uri.clone()
    }
}

/// Resolves drawable ids to image files in one directory.
///
/// Id `42` maps to the first of `42`, `42.png`, `42.webp`, `42.jpg` and
/// `42.jpeg` that exists.
#[derive(Debug, Clone)]
pub struct DirectoryResourceResolver {
    root: PathBuf,
}

impl DirectoryResourceResolver {
    /// Creates a resolver rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, id: &str) -> Result<PathBuf, SourceError> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(SourceError::NotFound {
                uri: format!("drawable://{id}"),
            });
        }
        let bare = self.root.join(id);
        std::iter::once(bare.clone())
            .chain(DRAWABLE_EXTENSIONS.iter().map(|ext| bare.with_extension(ext)))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| SourceError::NotFound {
                uri: format!("drawable://{id}"),
            })
    }
}

impl ResourceResolver for DirectoryResourceResolver {
    fn open_drawable(&self, id: &str) -> Result<ByteStream, SourceError> {
        let path = self.locate(id)?;
        let file = File::open(&path).map_err(|e| SourceError::from_io(&path, &e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn drawable_length(&self, id: &str) -> Option<u64> {
        let path = self.locate(id).ok()?;
        std::fs::metadata(path).ok().map(|meta| meta.len())
    }
}

/// Resolves `content://authority/path` against a directory per authority.
#[derive(Debug, Clone, Default)]
pub struct AuthorityContentResolver {
    roots: HashMap<String, PathBuf>,
}

impl AuthorityContentResolver {
    /// Creates a resolver with no providers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `authority` from `root`.
    #[must_use]
    pub fn with_provider(mut self, authority: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.roots.insert(authority.into(), root.into());
        self
    }

    fn locate(&self, uri: &str) -> Result<PathBuf, SourceError> {
        let rest = uri
            .strip_prefix(CONTENT_SCHEME)
            .ok_or_else(|| SourceError::open(uri, "not a content uri"))?;
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let root = self
            .roots
            .get(authority)
            .ok_or_else(|| SourceError::open(uri, format!("unknown provider '{authority}'")))?;
        let path = path.split(['?', '#']).next().unwrap_or_default();
        join_within_root(root, path)
    }
}

impl ContentResolver for AuthorityContentResolver {
    fn open(&self, uri: &str) -> Result<ByteStream, SourceError> {
        let path = self.locate(uri)?;
        let file = File::open(&path).map_err(|e| SourceError::from_io(&path, &e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn length(&self, uri: &str) -> Option<u64> {
        let path = self.locate(uri).ok()?;
        std::fs::metadata(path).ok().map(|meta| meta.len())
    }
}
