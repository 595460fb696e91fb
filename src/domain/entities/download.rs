//! Result of a completed network fetch.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use super::ImageFrom;

/// Where the downloaded bytes live.
#[derive(Debug, Clone)]
pub enum DownloadPayload {
    /// Bytes kept in memory (disk caching disabled or the write failed).
    Bytes(Bytes),
    /// Bytes persisted to a disk cache file.
    DiskCache(PathBuf),
}

/// Successful download handed to a network `UriModel` to build its data source.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    payload: DownloadPayload,
    length: u64,
    from: ImageFrom,
}

impl DownloadResult {
    /// Wraps bytes that were not written to the disk cache.
    #[must_use]
    pub fn in_memory(bytes: Bytes, from: ImageFrom) -> Self {
        let length = bytes.len() as u64;
        Self {
            payload: DownloadPayload::Bytes(bytes),
            length,
            from,
        }
    }

    /// Points at bytes already persisted in the disk cache.
    #[must_use]
    pub fn persisted(path: impl Into<PathBuf>, length: u64, from: ImageFrom) -> Self {
        Self {
            payload: DownloadPayload::DiskCache(path.into()),
            length,
            from,
        }
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &DownloadPayload {
        &self.payload
    }

    /// Returns the byte length.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.length
    }

    /// Returns true if no bytes were downloaded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns true if the bytes are on disk.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        matches!(self.payload, DownloadPayload::DiskCache(_))
    }

    /// Returns the disk cache file, if persisted.
    #[must_use]
    pub fn cache_path(&self) -> Option<&Path> {
        match &self.payload {
            DownloadPayload::DiskCache(path) => Some(path),
            DownloadPayload::Bytes(_) => None,
        }
    }

    /// Returns where the bytes came from.
    #[must_use]
    pub const fn from(&self) -> ImageFrom {
        self.from
    }
}
