//! Streaming archive writer
//!
//! Entries are handed to the compressor as soon as they are added; the
//! compressed output accumulates in a single in-memory buffer that
//! `finalize` returns. A failed entry is recorded and skipped rather than
//! aborting the archive.

use crate::error::{ArchiveError, ArchiveResult};
use crate::types::{ArchiveFormat, EntryFailure, FinishedArchive, WriteOptions};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use tar::{Builder, EntryType, Header};
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

enum Sink {
    Zip(ZipWriter<Cursor<Vec<u8>>>),
    TarZst(Builder<zstd::Encoder<'static, Vec<u8>>>),
}

/// Writer for document archives
///
/// Entry names must be unique. Entry metadata is fixed (zero mtime, mode
/// 0644) so the same inputs always produce the same bytes.
pub struct ArchiveWriter {
    sink: Sink,
    format: ArchiveFormat,
    names: HashSet<String>,
    entry_count: usize,
    failures: Vec<EntryFailure>,
}

impl ArchiveWriter {
    /// Create a new writer with the given options
    pub fn new(options: &WriteOptions) -> ArchiveResult<Self> {
        let sink = match options.format {
            ArchiveFormat::Zip => Sink::Zip(ZipWriter::new(Cursor::new(Vec::new()))),
            ArchiveFormat::TarZst => {
                let encoder = zstd::Encoder::new(Vec::new(), options.compression_level)
                    .map_err(|e| ArchiveError::compression(format!("zstd encoder: {}", e)))?;
                Sink::TarZst(Builder::new(encoder))
            }
        };

        Ok(Self {
            sink,
            format: options.format,
            names: HashSet::new(),
            entry_count: 0,
            failures: Vec::new(),
        })
    }

    /// Create a new writer with default options
    pub fn with_defaults() -> ArchiveResult<Self> {
        Self::new(&WriteOptions::default())
    }

    /// Container format being written
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Number of entries written so far
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Entries dropped so far
    pub fn failures(&self) -> &[EntryFailure] {
        &self.failures
    }

    /// Add a named entry
    ///
    /// Returns `false` if the entry was dropped; the failure is kept and
    /// reported by `finalize`.
    pub fn add_entry(&mut self, path: &str, content: impl AsRef<[u8]>) -> bool {
        match self.try_add_entry(path, content.as_ref()) {
            Ok(()) => {
                self.entry_count += 1;
                true
            }
            Err(e) => {
                warn!(target: "docpack::archive", path, error = %e, "Dropping archive entry");
                self.failures.push(EntryFailure {
                    path: path.to_string(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    fn try_add_entry(&mut self, path: &str, data: &[u8]) -> ArchiveResult<()> {
        if !self.names.insert(path.to_string()) {
            return Err(ArchiveError::DuplicateEntry(path.to_string()));
        }

        match &mut self.sink {
            Sink::Zip(zip) => {
                let options = FileOptions::default()
                    .compression_method(CompressionMethod::Deflated)
                    .last_modified_time(zip::DateTime::default())
                    .unix_permissions(0o644)
                    .large_file(data.len() as u64 >= u32::MAX as u64);
                zip.start_file(path, options)?;
                zip.write_all(data)?;
            }
            Sink::TarZst(builder) => {
                let mut header = Header::new_gnu();
                header.set_entry_type(EntryType::Regular);
                header.set_size(data.len() as u64);
                header.set_mode(0o644);
                header.set_mtime(0); // Reproducible builds: zero mtime
                builder
                    .append_data(&mut header, path, data)
                    .map_err(|e| ArchiveError::archive(format!("append '{}': {}", path, e)))?;
            }
        }

        Ok(())
    }

    /// Scope further entries under `path/`
    pub fn directory(&mut self, path: &str) -> ScopedWriter<'_> {
        ScopedWriter {
            prefix: path.trim_end_matches('/').to_string(),
            writer: self,
        }
    }

    /// Flush the compressor and return the finished archive
    pub fn finalize(self) -> ArchiveResult<FinishedArchive> {
        let bytes = match self.sink {
            Sink::Zip(mut zip) => zip.finish()?.into_inner(),
            Sink::TarZst(builder) => {
                let encoder = builder
                    .into_inner()
                    .map_err(|e| ArchiveError::archive(format!("tar finish: {}", e)))?;
                encoder
                    .finish()
                    .map_err(|e| ArchiveError::compression(format!("zstd finish: {}", e)))?
            }
        };

        debug!(
            target: "docpack::archive",
            format = %self.format,
            entries = self.entry_count,
            failed = self.failures.len(),
            bytes = bytes.len(),
            "Archive finalized"
        );

        Ok(FinishedArchive {
            bytes,
            format: self.format,
            entry_count: self.entry_count,
            failures: self.failures,
        })
    }
}

/// A view of an `ArchiveWriter` that prefixes entry paths with a directory
pub struct ScopedWriter<'w> {
    writer: &'w mut ArchiveWriter,
    prefix: String,
}

impl<'w> ScopedWriter<'w> {
    /// Directory prefix, without trailing slash
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Add an entry at `<prefix>/<name>`
    pub fn add_entry(&mut self, name: &str, content: impl AsRef<[u8]>) -> bool {
        let path = format!("{}/{}", self.prefix, name);
        self.writer.add_entry(&path, content)
    }

    /// Scope further under `<prefix>/<path>/`
    pub fn directory(&mut self, path: &str) -> ScopedWriter<'_> {
        ScopedWriter {
            prefix: format!("{}/{}", self.prefix, path.trim_end_matches('/')),
            writer: &mut *self.writer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn zip_names(data: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    fn tar_entries(data: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut decoder = zstd::Decoder::new(data).unwrap();
        let mut tar_data = Vec::new();
        decoder.read_to_end(&mut tar_data).unwrap();

        let mut archive = tar::Archive::new(&tar_data[..]);
        archive
            .entries()
            .unwrap()
            .map(|e| {
                let mut e = e.unwrap();
                let path = e.path().unwrap().to_string_lossy().to_string();
                let mut buf = Vec::new();
                e.read_to_end(&mut buf).unwrap();
                (path, buf)
            })
            .collect()
    }

    #[test]
    fn test_zip_structure() {
        let mut writer = ArchiveWriter::with_defaults().unwrap();
        assert!(writer.add_entry("info.json", "{}"));
        assert!(writer.add_entry("doc.snapshot.json", b"{\"a\":1}".to_vec()));

        let finished = writer.finalize().unwrap();

        assert_eq!(finished.format, ArchiveFormat::Zip);
        assert_eq!(finished.entry_count, 2);
        assert!(finished.is_complete());
        assert_eq!(ArchiveFormat::detect(&finished.bytes), Some(ArchiveFormat::Zip));
        assert_eq!(zip_names(&finished.bytes), vec!["info.json", "doc.snapshot.json"]);
    }

    #[test]
    fn test_zip_entry_content() {
        let mut writer = ArchiveWriter::with_defaults().unwrap();
        let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        writer.add_entry("assets/big.bin", &payload);
        let finished = writer.finalize().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(&finished.bytes[..])).unwrap();
        let mut file = archive.by_name("assets/big.bin").unwrap();
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, payload);
    }

    #[test]
    fn test_tar_zst_structure() {
        let options = WriteOptions {
            format: ArchiveFormat::TarZst,
            ..WriteOptions::default()
        };
        let mut writer = ArchiveWriter::new(&options).unwrap();
        writer.add_entry("info.json", "{\"pageVersion\": 2}");
        writer.add_entry("assets/a.png", [1u8, 2, 3]);

        let finished = writer.finalize().unwrap();
        assert_eq!(ArchiveFormat::detect(&finished.bytes), Some(ArchiveFormat::TarZst));

        let entries = tar_entries(&finished.bytes);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "info.json");
        assert_eq!(entries[1], ("assets/a.png".to_string(), vec![1, 2, 3]));
    }

    #[test]
    fn test_scoped_directories_nest() {
        let mut writer = ArchiveWriter::with_defaults().unwrap();
        {
            let mut assets = writer.directory("assets/");
            assert_eq!(assets.prefix(), "assets");
            assets.add_entry("a.png", [0u8]);
            let mut nested = assets.directory("thumbs");
            nested.add_entry("a.png", [1u8]);
            nested.directory("x").add_entry("y.txt", "y");
        }
        writer.add_entry("info.json", "{}");

        let finished = writer.finalize().unwrap();
        assert_eq!(
            zip_names(&finished.bytes),
            vec![
                "assets/a.png",
                "assets/thumbs/a.png",
                "assets/thumbs/x/y.txt",
                "info.json"
            ]
        );
    }

    #[test]
    fn test_duplicate_entry_is_recorded_not_fatal() {
        let mut writer = ArchiveWriter::with_defaults().unwrap();
        assert!(writer.add_entry("info.json", "{}"));
        assert!(!writer.add_entry("info.json", "{\"again\": true}"));
        assert!(writer.add_entry("other.snapshot.json", "{}"));
        assert_eq!(writer.failures().len(), 1);

        let finished = writer.finalize().unwrap();
        assert_eq!(finished.entry_count, 2);
        assert!(!finished.is_complete());
        assert_eq!(finished.failures[0].path, "info.json");
        assert!(finished.failures[0].reason.contains("Duplicate"));
    }

    #[test]
    fn test_zero_byte_entry() {
        let mut writer = ArchiveWriter::with_defaults().unwrap();
        writer.add_entry("assets/empty.bin", [0u8; 0]);
        let finished = writer.finalize().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(&finished.bytes[..])).unwrap();
        assert_eq!(archive.by_name("assets/empty.bin").unwrap().size(), 0);
    }

    #[test]
    fn test_output_is_deterministic() {
        let build = |format| {
            let mut writer = ArchiveWriter::new(&WriteOptions {
                format,
                ..WriteOptions::default()
            })
            .unwrap();
            writer.add_entry("info.json", "{}");
            writer.add_entry("assets/a.txt", "abc");
            writer.finalize().unwrap().bytes
        };

        assert_eq!(build(ArchiveFormat::Zip), build(ArchiveFormat::Zip));
        assert_eq!(build(ArchiveFormat::TarZst), build(ArchiveFormat::TarZst));
    }

    #[test]
    fn test_empty_archive_finalizes() {
        let finished = ArchiveWriter::with_defaults().unwrap().finalize().unwrap();
        assert_eq!(finished.entry_count, 0);
        assert_eq!(ArchiveFormat::detect(&finished.bytes), Some(ArchiveFormat::Zip));
    }
}
