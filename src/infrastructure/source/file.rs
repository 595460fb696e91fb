//! Data sources backed by a path on the local filesystem.

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use crate::domain::entities::ImageFrom;
use crate::domain::errors::SourceError;
use crate::domain::ports::{ByteStream, DataSource};

/// Reads a file; used for plain files, assets and disk cache entries.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    path: PathBuf,
    known_length: Option<u64>,
    from: ImageFrom,
}

impl FileDataSource {
    /// Source for a user-supplied file path.
    #[must_use]
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            known_length: None,
            from: ImageFrom::LocalFile,
        }
    }

    /// Source for a file under the asset root.
    #[must_use]
    pub fn asset(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            known_length: None,
            from: ImageFrom::Asset,
        }
    }

    /// Source for a disk cache entry whose length is already known.
    #[must_use]
    pub fn cached(path: impl Into<PathBuf>, length: u64, from: ImageFrom) -> Self {
        Self {
            path: path.into(),
            known_length: Some(length),
            from,
        }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for FileDataSource {
    fn open(&self) -> Result<ByteStream, SourceError> {
        let file = File::open(&self.path).map_err(|e| SourceError::from_io(&self.path, &e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn length(&self) -> Option<u64> {
        self.known_length
            .or_else(|| std::fs::metadata(&self.path).ok().map(|meta| meta.len()))
    }

    fn image_from(&self) -> ImageFrom {
        self.from
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Joins `relative` onto `root`, rejecting anything that could leave it.
///
/// # Errors
/// Returns [`SourceError::PathEscapesRoot`] for empty, absolute or `..` paths.
pub fn join_within_root(root: &Path, relative: &str) -> Result<PathBuf, SourceError> {
    let escapes = || SourceError::PathEscapesRoot {
        name: relative.to_string(),
    };
    let relative_path = Path::new(relative);
    if relative.is_empty() {
        return Err(escapes());
    }
    if !relative_path
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
    {
        return Err(escapes());
    }
    Ok(root.join(relative_path))
}
