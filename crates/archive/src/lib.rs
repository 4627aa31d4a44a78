//! Document archive container
//!
//! This crate reads and writes the archives that carry a document
//! collection between instances.
//!
//! ## Archive Structure
//!
//! ```text
//! export.zip
//! ├── info.json               # collection info (page schema version, properties)
//! ├── <docId>.snapshot.json   # one pretty-printed snapshot per document
//! └── assets/
//!     └── <assetId>.<ext>     # raw asset payloads
//! ```
//!
//! The container is zip (deflate) by default; zstd-compressed tar is also
//! written and read. Readers pick the container from the magic bytes.
//!
//! ## Usage
//!
//! ```ignore
//! let mut writer = ArchiveWriter::with_defaults()?;
//! writer.add_entry("info.json", info_json);
//! writer.directory("assets").add_entry("a.png", png_bytes);
//! let archive = writer.finalize()?;
//!
//! let mut reader = ArchiveReader::new();
//! reader.load(archive.bytes);
//! reader.iterate(|path, content| match classify(path) { /* ... */ })?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assets;
pub mod entry;
pub mod error;
pub mod reader;
pub mod types;
pub mod writer;

pub use assets::{asset_file_name, create_assets_archive, stage_assets};
pub use entry::{classify, is_platform_artifact, AssetEntry, EntryKind};
pub use error::{ArchiveError, ArchiveResult};
pub use reader::ArchiveReader;
pub use types::{
    paths, xxh3_hex, ArchiveFormat, EntryFailure, FinishedArchive, WriteOptions,
    PLATFORM_ARTIFACT_MARKERS,
};
pub use writer::{ArchiveWriter, ScopedWriter};
