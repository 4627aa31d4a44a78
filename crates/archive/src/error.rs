//! Archive error types

use std::io;
use thiserror::Error;

/// Errors that can occur while writing or reading an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Bytes do not start with a known container signature
    #[error("Unknown archive format (leading bytes: {0})")]
    UnknownFormat(String),

    /// Entry name already used in this archive
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Container (zip/tar) operation failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Compression/decompression failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ArchiveError {
    /// Create an archive error
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Create a compression error
    pub fn compression(msg: impl Into<String>) -> Self {
        Self::Compression(msg.into())
    }

    /// Create an unknown format error from the first bytes of a blob
    pub fn unknown_format(data: &[u8]) -> Self {
        let head: Vec<String> = data.iter().take(4).map(|b| format!("{:02x}", b)).collect();
        Self::UnknownFormat(head.join(" "))
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => ArchiveError::Io(io),
            other => ArchiveError::Archive(other.to_string()),
        }
    }
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;
