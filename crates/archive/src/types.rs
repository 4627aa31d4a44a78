//! Archive core types
//!
//! Layout constants, container formats, and writer options/results.

use std::fmt;
use std::str::FromStr;

/// Entry names within an archive
pub mod paths {
    /// Collection metadata entry
    pub const INFO: &str = "info.json";
    /// Suffix of document snapshot entries
    pub const SNAPSHOT_SUFFIX: &str = ".snapshot.json";
    /// Directory holding asset payloads
    pub const ASSETS_DIR: &str = "assets";
    /// Prefix of asset entries
    pub const ASSETS_PREFIX: &str = "assets/";

    /// Entry name for a document snapshot
    pub fn snapshot(doc_id: &str) -> String {
        format!("{}{}", doc_id, SNAPSHOT_SUFFIX)
    }
}

/// Substrings marking platform junk (macOS resource forks, Finder metadata)
pub const PLATFORM_ARTIFACT_MARKERS: &[&str] = &["MACOSX", "DS_Store"];

/// Leading bytes of a zip local file header
pub const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Leading bytes of an empty zip (end of central directory only)
pub const ZIP_EMPTY_MAGIC: &[u8; 4] = b"PK\x05\x06";

/// Leading bytes of a zstd frame
pub const ZSTD_MAGIC: &[u8; 4] = &[0x28, 0xb5, 0x2f, 0xfd];

/// Container format of an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFormat {
    /// Deflate-compressed zip (default, opens with any unzip tool)
    #[default]
    Zip,
    /// zstd-compressed tar
    TarZst,
}

impl ArchiveFormat {
    /// Detect the format from the leading bytes of a blob
    pub fn detect(data: &[u8]) -> Option<Self> {
        let head = data.get(..4)?;
        if head == ZIP_MAGIC || head == ZIP_EMPTY_MAGIC {
            Some(Self::Zip)
        } else if head == ZSTD_MAGIC {
            Some(Self::TarZst)
        } else {
            None
        }
    }

    /// Conventional file extension, without a leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarZst => "tar.zst",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArchiveFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zip" => Ok(Self::Zip),
            "tar.zst" | "tarzst" => Ok(Self::TarZst),
            other => Err(format!(
                "unknown archive format '{}', expected \"zip\" or \"tar.zst\"",
                other
            )),
        }
    }
}

/// Options for writing an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Container format
    pub format: ArchiveFormat,
    /// Zstd compression level (1-22, default: 3); used by `TarZst`
    pub compression_level: i32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            format: ArchiveFormat::Zip,
            compression_level: 3,
        }
    }
}

/// An entry that could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    /// Full entry path
    pub path: String,
    /// Why the entry was dropped
    pub reason: String,
}

/// A finalized archive
#[derive(Debug, Clone)]
pub struct FinishedArchive {
    /// Compressed archive bytes
    pub bytes: Vec<u8>,
    /// Container format
    pub format: ArchiveFormat,
    /// Number of entries successfully written
    pub entry_count: usize,
    /// Entries that were dropped while writing
    pub failures: Vec<EntryFailure>,
}

impl FinishedArchive {
    /// True when every entry was written
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// xxh3 checksum of the archive bytes
    pub fn checksum(&self) -> String {
        xxh3_hex(&self.bytes)
    }
}

/// Compute xxh3 hash of data and return as hex string
pub fn xxh3_hex(data: &[u8]) -> String {
    use xxhash_rust::xxh3::xxh3_64;
    format!("{:016x}", xxh3_64(data))
}
