//! Collection export/import
//!
//! High-level functions that move documents between a `DocCollection` and a
//! document archive.
//!
//! ## Export
//!
//! Documents are converted to snapshots in parallel. The collection info,
//! every snapshot, and every blob a snapshot references are written into a
//! single archive. Documents that cannot be snapshotted are skipped and
//! reported; the export carries on.
//!
//! ## Import
//!
//! The archive is read in full and every JSON entry parsed before anything
//! touches the destination, so a corrupt archive leaves the collection as it
//! was. Bundled assets are re-keyed by content hash, then every snapshot is
//! rebuilt through the middleware chain. Docs and their assets are stored
//! only after all of them were rebuilt.

use crate::error::{EngineError, EngineResult};
use crate::job::Job;
use crate::middleware::import_middlewares;
use docpack_archive::{
    classify, create_assets_archive, paths, ArchiveError, ArchiveFormat, ArchiveReader,
    AssetEntry, EntryFailure, EntryKind, WriteOptions,
};
use docpack_core::{
    mime_for_extension, Asset, CollectionInfo, CoreError, Doc, DocCollection, DocSnapshot,
    ImportContext,
};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{info, trace, warn};

/// Prefix marking a `sourceId` whose asset is bundled in the archive
pub const BUNDLED_ASSET_MARKER: char = '/';

// =============================================================================
// Public option and result types
// =============================================================================

/// Options for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Container format and compression level
    pub write: WriteOptions,
    /// Write bundled asset references as `/<id>`
    pub mark_bundled_assets: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            write: WriteOptions::default(),
            mark_bundled_assets: true,
        }
    }
}

/// Information returned after exporting documents
#[derive(Debug, Clone)]
pub struct ExportInfo {
    /// The finished archive
    pub bytes: Vec<u8>,
    /// Container format of `bytes`
    pub format: ArchiveFormat,
    /// Number of documents written
    pub doc_count: usize,
    /// Ids of documents that could not be converted
    pub skipped: Vec<String>,
    /// Number of assets written
    pub asset_count: usize,
    /// xxh3 hex digest of `bytes`
    pub checksum: String,
    /// Entries that could not be written
    pub failures: Vec<EntryFailure>,
}

impl ExportInfo {
    /// Whether every document and entry made it into the archive
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failures.is_empty()
    }
}

/// Contents of an archive, read without importing it
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// Detected container format
    pub format: ArchiveFormat,
    /// Parsed `info.json`, if present
    pub info: Option<CollectionInfo>,
    /// Snapshot entry paths, in archive order
    pub snapshot_entries: Vec<String>,
    /// Bundled asset ids, in archive order
    pub asset_ids: Vec<String>,
    /// Entries import would skip
    pub ignored_entries: Vec<String>,
}

// =============================================================================
// Export
// =============================================================================

/// Export documents into an archive with default options
///
/// # Errors
///
/// - The compressor cannot be opened or finished
/// - Serialization fails
pub fn export_docs(collection: &dyn DocCollection, docs: &[Doc]) -> EngineResult<ExportInfo> {
    export_docs_with_options(collection, docs, &ExportOptions::default())
}

/// Export documents into an archive with custom options
pub fn export_docs_with_options(
    collection: &dyn DocCollection,
    docs: &[Doc],
    options: &ExportOptions,
) -> EngineResult<ExportInfo> {
    let job = Job::new(collection);

    // 1. Convert in parallel; order follows `docs`
    let converted: Vec<(&Doc, Option<DocSnapshot>)> = docs
        .par_iter()
        .map(|doc| (doc, job.doc_to_snapshot(doc)))
        .collect();

    let mut snapshots = Vec::with_capacity(converted.len());
    let mut skipped = Vec::new();
    for (doc, snapshot) in converted {
        match snapshot {
            Some(snapshot) => snapshots.push(snapshot),
            None => {
                warn!(target: "docpack::export", doc_id = doc.id(), "Skipping doc without root block");
                skipped.push(doc.id().to_string());
            }
        }
    }

    // 2. Mark references the importer must content-address
    if options.mark_bundled_assets {
        for snapshot in &mut snapshots {
            snapshot.walk_mut(|block| {
                let Some(id) = block.source_id() else {
                    return;
                };
                if job.assets().contains(id) {
                    let marked = format!("{}{}", BUNDLED_ASSET_MARKER, id);
                    block.set_source_id(marked);
                }
            });
        }
    }

    // 3. Assets first, then metadata and snapshots
    let asset_ids = job.assets().ids();
    let mut writer = create_assets_archive(job.assets(), &asset_ids, &options.write)?;
    let asset_count = writer.entry_count();

    let info_json = serde_json::to_vec_pretty(&job.collection_info_to_snapshot())?;
    writer.add_entry(paths::INFO, info_json);

    let entries = snapshots
        .par_iter()
        .map(|snapshot| -> EngineResult<(String, Vec<u8>)> {
            Ok((paths::snapshot(snapshot.id()), serde_json::to_vec_pretty(snapshot)?))
        })
        .collect::<EngineResult<Vec<_>>>()?;
    for (path, content) in entries {
        writer.add_entry(&path, content);
    }

    // 4. Finish
    let finished = writer.finalize()?;
    let checksum = finished.checksum();

    info!(
        target: "docpack::export",
        docs = snapshots.len(),
        skipped = skipped.len(),
        assets = asset_count,
        failed_entries = finished.failures.len(),
        bytes = finished.bytes.len(),
        format = %finished.format,
        "Export complete"
    );

    Ok(ExportInfo {
        bytes: finished.bytes,
        format: finished.format,
        doc_count: snapshots.len(),
        skipped,
        asset_count,
        checksum,
        failures: finished.failures,
    })
}

/// Export documents and write the archive to `path`
///
/// The archive is written to a temporary file first and renamed into place.
/// Parent directories are created as needed.
pub fn export_docs_to_file(
    collection: &dyn DocCollection,
    docs: &[Doc],
    path: &Path,
    options: &ExportOptions,
) -> EngineResult<ExportInfo> {
    let export = export_docs_with_options(collection, docs, options)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    if let Err(e) = fs::write(&temp_path, &export.bytes) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(export)
}

// =============================================================================
// Import
// =============================================================================

/// Raw entries of an archive, sorted by kind
#[derive(Default)]
struct ArchiveContents {
    info: Option<Vec<u8>>,
    snapshots: Vec<(String, Vec<u8>)>,
    assets: Vec<(AssetEntry, Vec<u8>)>,
    ignored: Vec<String>,
}

impl ArchiveContents {
    fn read(reader: &ArchiveReader) -> EngineResult<Self> {
        let mut contents = Self::default();
        reader.iterate(|path, content| match classify(path) {
            EntryKind::Metadata => contents.info = Some(content),
            EntryKind::Snapshot => contents.snapshots.push((path.to_string(), content)),
            EntryKind::Asset(entry) => contents.assets.push((entry, content)),
            EntryKind::Ignored => {
                trace!(target: "docpack::import", path, "Ignoring archive entry");
                contents.ignored.push(path.to_string());
            }
        })?;
        Ok(contents)
    }

    fn parse_info(&self) -> EngineResult<Option<CollectionInfo>> {
        self.info
            .as_deref()
            .map(|bytes| {
                serde_json::from_slice(bytes).map_err(|e| EngineError::malformed(paths::INFO, e))
            })
            .transpose()
    }

    fn parse_snapshots(&self) -> EngineResult<Vec<DocSnapshot>> {
        self.snapshots
            .par_iter()
            .map(|(path, bytes)| -> EngineResult<DocSnapshot> {
                let snapshot: DocSnapshot = serde_json::from_slice(bytes)
                    .map_err(|e| EngineError::malformed(path.as_str(), e))?;
                if snapshot.id().trim().is_empty() {
                    let reason = format!("{}: empty doc id", path);
                    return Err(CoreError::invalid_snapshot(reason).into());
                }
                Ok(snapshot)
            })
            .collect()
    }
}

/// Import every document in an archive into `collection`
///
/// Returns the stored documents in archive order. Colliding ids are
/// replaced, documents are migrated from the archive's `pageVersion`
/// (0 when `info.json` is absent), and blank titles become `Untitled`.
///
/// # Errors
///
/// - The bytes are not a readable archive
/// - `info.json` or any snapshot is malformed; nothing is written
/// - A middleware or the upgrade hook fails; nothing is written
/// - The collection rejects a document or blob
pub fn import_docs(
    collection: &dyn DocCollection,
    data: impl Into<Vec<u8>>,
) -> EngineResult<Vec<Doc>> {
    // 1. Read and classify every entry
    let mut reader = ArchiveReader::new();
    reader.load(data);
    let contents = ArchiveContents::read(&reader)?;

    // 2. Parse all JSON before touching the destination
    let page_version = contents
        .parse_info()?
        .and_then(|info| info.page_version)
        .unwrap_or(0);
    let mut snapshots = contents.parse_snapshots()?;

    let job = Job::with_middlewares(collection, import_middlewares(page_version));

    // 3. Buffer bundled assets under their archive ids
    let asset_entries = contents.assets.len();
    for (entry, bytes) in contents.assets {
        let asset = Asset::new(bytes, mime_for_extension(&entry.extension)).with_name(entry.file_name);
        job.assets().insert(entry.id, asset);
    }

    // 4. Re-key marked references by content hash
    let marked: BTreeSet<String> = snapshots
        .iter()
        .flat_map(|snapshot| snapshot.source_ids())
        .filter_map(|id| id.strip_prefix(BUNDLED_ASSET_MARKER))
        .map(str::to_string)
        .collect();

    let hashes: HashMap<String, String> = marked
        .par_iter()
        .filter_map(|id| job.assets().rekey_by_content(id).map(|hash| (id.clone(), hash)))
        .collect();

    for snapshot in &mut snapshots {
        snapshot.walk_mut(|block| {
            let Some(hash) = block
                .source_id()
                .and_then(|id| id.strip_prefix(BUNDLED_ASSET_MARKER))
                .and_then(|id| hashes.get(id))
            else {
                return;
            };
            block.set_source_id(hash.clone());
        });
    }

    // 5. Rebuild every doc through the middleware chain, in archive order
    let ctx = ImportContext::new(collection, &snapshots);
    let docs = snapshots
        .into_iter()
        .map(|snapshot| job.snapshot_to_doc(snapshot, &ctx))
        .collect::<Result<Vec<_>, _>>()?;

    // 6. Store only once every doc was rebuilt
    for doc in &docs {
        job.store_doc(doc)?;
    }

    info!(
        target: "docpack::import",
        docs = docs.len(),
        assets = asset_entries,
        rekeyed = hashes.len(),
        ignored = contents.ignored.len(),
        page_version,
        "Import complete"
    );

    Ok(docs)
}

/// Import every document in the archive at `path`
pub fn import_docs_from_file(collection: &dyn DocCollection, path: &Path) -> EngineResult<Vec<Doc>> {
    let data = fs::read(path)?;
    import_docs(collection, data)
}

// =============================================================================
// Inspect
// =============================================================================

/// Read an archive without importing it
///
/// Every JSON entry is parsed, so a summary is only returned for an archive
/// that `import_docs` would accept.
pub fn inspect_archive(data: &[u8]) -> EngineResult<ArchiveSummary> {
    let format = ArchiveFormat::detect(data).ok_or_else(|| ArchiveError::unknown_format(data))?;

    let mut reader = ArchiveReader::new();
    reader.load(data);
    let contents = ArchiveContents::read(&reader)?;

    let info = contents.parse_info()?;
    contents.parse_snapshots()?;

    Ok(ArchiveSummary {
        format,
        info,
        snapshot_entries: contents.snapshots.iter().map(|(path, _)| path.clone()).collect(),
        asset_ids: contents.assets.iter().map(|(entry, _)| entry.id.clone()).collect(),
        ignored_entries: contents.ignored,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCollection;
    use docpack_archive::ArchiveWriter;
    use docpack_core::{Block, DocMeta};
    use tempfile::TempDir;

    fn page(id: &str, title: &str) -> Doc {
        Doc::new(
            DocMeta::new(id, title),
            Block::new(format!("{}-root", id), "affine:page")
                .with_child(Block::new(format!("{}-p", id), "affine:paragraph").with_prop("text", "hello")),
        )
    }

    #[test]
    fn test_export_entry_layout() {
        let collection = MemoryCollection::new("ws", 2);
        let info = export_docs(&collection, &[page("a", "A"), page("b", "B")]).unwrap();

        assert!(info.is_complete());
        assert_eq!(info.doc_count, 2);
        assert_eq!(info.asset_count, 0);
        assert_eq!(info.checksum.len(), 16);

        let summary = inspect_archive(&info.bytes).unwrap();
        assert_eq!(summary.format, ArchiveFormat::Zip);
        assert_eq!(summary.info.unwrap().page_version, Some(2));
        assert_eq!(summary.snapshot_entries, vec!["a.snapshot.json", "b.snapshot.json"]);
        assert!(summary.asset_ids.is_empty());
    }

    #[test]
    fn test_rootless_doc_is_skipped() {
        let collection = MemoryCollection::new("ws", 1);
        let broken = Doc {
            meta: DocMeta::new("broken", ""),
            root: None,
        };
        let info = export_docs(&collection, &[page("a", "A"), broken]).unwrap();

        assert_eq!(info.doc_count, 1);
        assert_eq!(info.skipped, vec!["broken"]);
        assert!(!info.is_complete());
    }

    #[test]
    fn test_snapshots_are_pretty_printed() {
        let collection = MemoryCollection::new("ws", 1);
        let info = export_docs(&collection, &[page("a", "A")]).unwrap();

        let mut reader = ArchiveReader::new();
        reader.load(info.bytes);
        let entries = reader.entries().unwrap();
        let (_, snapshot) = entries
            .iter()
            .find(|(path, _)| path == "a.snapshot.json")
            .unwrap();
        assert!(String::from_utf8_lossy(snapshot).contains("\n  \"meta\""));
    }

    #[test]
    fn test_import_without_info_uses_version_zero() {
        let versions = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen = std::sync::Arc::clone(&versions);
        let dest = MemoryCollection::new("dst", 5).with_upgrade_hook(move |from, _, _| {
            seen.lock().push(from);
            Ok(())
        });

        let mut writer = ArchiveWriter::with_defaults().unwrap();
        let snapshot = page("a", "A").to_snapshot().unwrap();
        writer.add_entry("a.snapshot.json", serde_json::to_vec(&snapshot).unwrap());
        let bytes = writer.finalize().unwrap().bytes;

        import_docs(&dest, bytes).unwrap();
        assert_eq!(*versions.lock(), vec![0]);
    }

    #[test]
    fn test_malformed_info_is_fatal() {
        let mut writer = ArchiveWriter::with_defaults().unwrap();
        writer.add_entry("info.json", "{ not json");
        writer.add_entry("a.snapshot.json", serde_json::to_vec(&page("a", "A").to_snapshot().unwrap()).unwrap());
        let bytes = writer.finalize().unwrap().bytes;

        let dest = MemoryCollection::new("dst", 1);
        let err = import_docs(&dest, bytes).unwrap_err();
        assert!(matches!(err, EngineError::MalformedEntry { ref entry, .. } if entry == "info.json"));
        assert!(dest.is_empty());
    }

    #[test]
    fn test_snapshot_without_id_is_rejected() {
        let mut writer = ArchiveWriter::with_defaults().unwrap();
        writer.add_entry("a.snapshot.json", serde_json::to_vec(&page("a", "A").to_snapshot().unwrap()).unwrap());
        writer.add_entry("blank.snapshot.json", serde_json::to_vec(&page("  ", "B").to_snapshot().unwrap()).unwrap());
        let bytes = writer.finalize().unwrap().bytes;

        let dest = MemoryCollection::new("dst", 1);
        let err = import_docs(&dest, bytes.clone()).unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::InvalidSnapshot(ref msg)) if msg.contains("blank.snapshot.json")));
        assert!(dest.is_empty());
        assert!(inspect_archive(&bytes).is_err());
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        let err = inspect_archive(b"garbage bytes").unwrap_err();
        assert!(matches!(err, EngineError::Archive(ArchiveError::UnknownFormat(_))));
    }

    #[test]
    fn test_export_to_file_is_atomic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("export.zip");
        let collection = MemoryCollection::new("ws", 1);

        let info = export_docs_to_file(&collection, &[page("a", "A")], &path, &ExportOptions::default()).unwrap();

        assert_eq!(fs::read(&path).unwrap(), info.bytes);
        assert!(!path.with_extension("tmp").exists());

        let dest = MemoryCollection::new("dst", 1);
        let docs = import_docs_from_file(&dest, &path).unwrap();
        assert_eq!(docs.len(), 1);
    }
}
