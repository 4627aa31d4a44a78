//! Capability traits at the seams of the transformer
//!
//! `DocCollection` is the host-supplied document backend. `JobMiddleware`
//! hooks into snapshot → doc conversion during import.

use std::collections::HashSet;

use crate::asset::Asset;
use crate::error::CoreResult;
use crate::types::{CollectionInfo, Doc, DocSnapshot, SnapshotKind};

/// Options handed to the schema upgrade hook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Upgrade even if the document already reports the target version
    pub force: bool,
}

/// Document collection backend
///
/// Implementations own the documents and the blob store of one collection.
/// The transformer only reads docs and blobs during export, and only inserts
/// docs and blobs during import.
///
/// Thread safety: all methods must be safe to call concurrently
/// (requires Send + Sync); export converts documents in parallel.
pub trait DocCollection: Send + Sync {
    /// Collection-level metadata, including the current page schema version
    fn info(&self) -> CollectionInfo;

    /// Fetch a document by id
    fn doc(&self, id: &str) -> Option<Doc>;

    /// Whether a document id is already taken
    fn has_doc(&self, id: &str) -> bool;

    /// Store a new document
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DocAlreadyExists` if the id is taken.
    fn insert_doc(&self, doc: Doc) -> CoreResult<()>;

    /// Fetch a blob by id
    fn blob(&self, id: &str) -> Option<Asset>;

    /// Store a blob; storing the same id twice overwrites
    fn put_blob(&self, id: &str, asset: Asset) -> CoreResult<()>;

    /// Upgrade a document's structure from `from_version` to the current schema
    fn upgrade_doc(
        &self,
        from_version: u32,
        options: &UpgradeOptions,
        doc: &mut Doc,
    ) -> CoreResult<()>;
}

/// Shared state visible to middlewares during one import call
pub struct ImportContext<'a> {
    /// Destination collection
    pub collection: &'a dyn DocCollection,
    /// Ids of every document being imported by this call
    pub imported_ids: HashSet<String>,
}

impl<'a> ImportContext<'a> {
    /// Build a context for importing `snapshots` into `collection`
    pub fn new(collection: &'a dyn DocCollection, snapshots: &[DocSnapshot]) -> Self {
        Self {
            collection,
            imported_ids: snapshots.iter().map(|s| s.meta.id.clone()).collect(),
        }
    }
}

/// A freshly reconstructed document, before it is stored
pub struct ImportPayload<'a> {
    /// Kind of the snapshot the doc was built from
    pub kind: SnapshotKind,
    /// The reconstructed document
    pub doc: &'a mut Doc,
}

/// Hook around snapshot → doc conversion
///
/// Middlewares run in registration order: every `before_import` sees the
/// snapshot after the previous middleware changed it, every `after_import`
/// sees the doc after the previous middleware changed it.
pub trait JobMiddleware: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Adjust a snapshot before it becomes a doc
    fn before_import(&self, _ctx: &ImportContext<'_>, _snapshot: &mut DocSnapshot) -> CoreResult<()> {
        Ok(())
    }

    /// Adjust a doc after reconstruction, before it is stored
    fn after_import(&self, _ctx: &ImportContext<'_>, _payload: ImportPayload<'_>) -> CoreResult<()> {
        Ok(())
    }
}
