//! Streaming archive reader
//!
//! `load` only captures the bytes; decompression happens in `iterate`, which
//! hands each file entry to the caller once its payload is complete.

use crate::error::{ArchiveError, ArchiveResult};
use crate::types::ArchiveFormat;
use std::io::{Cursor, Read};
use tar::{Archive, EntryType};
use tracing::trace;
use zip::ZipArchive;

/// Reader for document archives (zip or tar.zst, detected from magic bytes)
#[derive(Debug, Default)]
pub struct ArchiveReader {
    data: Option<Vec<u8>>,
}

impl ArchiveReader {
    /// Create a reader with nothing loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture archive bytes for later iteration
    pub fn load(&mut self, data: impl Into<Vec<u8>>) {
        self.data = Some(data.into());
    }

    /// Whether `load` has been called
    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// Detected container format of the loaded bytes
    pub fn format(&self) -> Option<ArchiveFormat> {
        self.data.as_deref().and_then(ArchiveFormat::detect)
    }

    /// Invoke `handler(path, content)` once per file entry, in archive order
    ///
    /// Directory markers are skipped. Without a prior `load` this is a no-op.
    ///
    /// # Errors
    ///
    /// - The bytes are not a zip or tar.zst archive
    /// - An entry cannot be decompressed
    pub fn iterate<F>(&self, mut handler: F) -> ArchiveResult<()>
    where
        F: FnMut(&str, Vec<u8>),
    {
        let Some(data) = self.data.as_deref() else {
            return Ok(());
        };

        match ArchiveFormat::detect(data) {
            Some(ArchiveFormat::Zip) => Self::iterate_zip(data, &mut handler),
            Some(ArchiveFormat::TarZst) => Self::iterate_tar_zst(data, &mut handler),
            None => Err(ArchiveError::unknown_format(data)),
        }
    }

    /// Collect every file entry as `(path, content)` pairs
    pub fn entries(&self) -> ArchiveResult<Vec<(String, Vec<u8>)>> {
        let mut entries = Vec::new();
        self.iterate(|path, content| entries.push((path.to_string(), content)))?;
        Ok(entries)
    }

    fn iterate_zip<F>(data: &[u8], handler: &mut F) -> ArchiveResult<()>
    where
        F: FnMut(&str, Vec<u8>),
    {
        let mut archive = ZipArchive::new(Cursor::new(data))?;

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                trace!(target: "docpack::archive", path = file.name(), "Skipping directory entry");
                continue;
            }

            let name = file.name().to_string();
            let mut content = Vec::with_capacity(read_capacity(file.size(), data.len()));
            file.read_to_end(&mut content)
                .map_err(|e| ArchiveError::compression(format!("inflate '{}': {}", name, e)))?;
            handler(&name, content);
        }

        Ok(())
    }

    fn iterate_tar_zst<F>(data: &[u8], handler: &mut F) -> ArchiveResult<()>
    where
        F: FnMut(&str, Vec<u8>),
    {
        let decoder = zstd::Decoder::new(data)
            .map_err(|e| ArchiveError::compression(format!("zstd decode: {}", e)))?;
        let mut archive = Archive::new(decoder);

        for entry in archive
            .entries()
            .map_err(|e| ArchiveError::archive(e.to_string()))?
        {
            let mut entry = entry.map_err(|e| ArchiveError::archive(e.to_string()))?;
            let name = entry
                .path()
                .map_err(|e| ArchiveError::archive(e.to_string()))?
                .to_string_lossy()
                .to_string();

            match entry.header().entry_type() {
                EntryType::Regular | EntryType::Continuous => {}
                EntryType::Directory => {
                    trace!(target: "docpack::archive", path = %name, "Skipping directory entry");
                    continue;
                }
                other => {
                    trace!(target: "docpack::archive", path = %name, kind = ?other, "Skipping non-file entry");
                    continue;
                }
            }

            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .map_err(|e| ArchiveError::archive(format!("read {}: {}", name, e)))?;
            handler(&name, content);
        }

        Ok(())
    }
}

/// Preallocation for an entry whose header declares `declared` bytes
///
/// The declared size comes from the archive and is untrusted; it is capped by
/// the size of the whole archive. Larger payloads still grow the buffer.
fn read_capacity(declared: u64, archive_len: usize) -> usize {
    usize::try_from(declared).unwrap_or(usize::MAX).min(archive_len)
}
