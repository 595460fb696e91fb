//! Data source over bytes already in memory.

use std::io::Cursor;

use bytes::Bytes;

use crate::domain::entities::ImageFrom;
use crate::domain::errors::SourceError;
use crate::domain::ports::{ByteStream, DataSource};

/// Serves a shared in-memory buffer.
#[derive(Debug, Clone)]
pub struct ByteArrayDataSource {
    bytes: Bytes,
    from: ImageFrom,
}

impl ByteArrayDataSource {
    /// Creates a source over `bytes`.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>, from: ImageFrom) -> Self {
        Self {
            bytes: bytes.into(),
            from,
        }
    }
}

impl DataSource for ByteArrayDataSource {
    fn open(&self) -> Result<ByteStream, SourceError> {
        Ok(Box::new(Cursor::new(self.bytes.clone())))
    }

    fn length(&self) -> Option<u64> {
        Some(self.bytes.len() as u64)
    }

    fn image_from(&self) -> ImageFrom {
        self.from
    }

    fn location(&self) -> String {
        format!("<{} bytes in memory>", self.bytes.len())
    }

    fn read_all(&self) -> Result<Vec<u8>, SourceError> {
        Ok(self.bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_each_open_starts_at_zero() {
        let source = ByteArrayDataSource::new(Bytes::from_static(b"abc"), ImageFrom::Network);
        for _ in 0..2 {
            let mut out = Vec::new();
            source.open().unwrap().read_to_end(&mut out).unwrap();
            assert_eq!(out, b"abc");
        }
        assert_eq!(source.length(), Some(3));
    }
}
