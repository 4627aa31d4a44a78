//! Conversion job
//!
//! A `Job` converts between live documents and snapshots for one collection.
//! It owns the asset map for the run: export fills it with every blob a
//! snapshot references, import fills it from the archive and drains it into
//! the destination blob store as documents are stored.

use docpack_core::{
    AssetMap, Block, CollectionInfo, CoreResult, Doc, DocCollection, DocSnapshot, ImportContext,
    ImportPayload, JobMiddleware,
};
use tracing::{debug, trace};

/// Bidirectional doc ↔ snapshot converter bound to one collection
pub struct Job<'c> {
    collection: &'c dyn DocCollection,
    assets: AssetMap,
    middlewares: Vec<Box<dyn JobMiddleware>>,
}

impl<'c> Job<'c> {
    /// Create a job with no middlewares
    pub fn new(collection: &'c dyn DocCollection) -> Self {
        Self::with_middlewares(collection, Vec::new())
    }

    /// Create a job whose imports run `middlewares` in the given order
    pub fn with_middlewares(
        collection: &'c dyn DocCollection,
        middlewares: Vec<Box<dyn JobMiddleware>>,
    ) -> Self {
        Self {
            collection,
            assets: AssetMap::new(),
            middlewares,
        }
    }

    /// The collection this job reads from or writes into
    pub fn collection(&self) -> &'c dyn DocCollection {
        self.collection
    }

    /// Assets tracked by this job
    pub fn assets(&self) -> &AssetMap {
        &self.assets
    }

    /// Names of the registered middlewares, in run order
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    /// Snapshot of the collection metadata
    pub fn collection_info_to_snapshot(&self) -> CollectionInfo {
        self.collection.info()
    }

    /// Convert a live doc into a snapshot
    ///
    /// Every blob the snapshot references is copied from the collection into
    /// the job's asset map. Returns `None` for a doc without a root block.
    pub fn doc_to_snapshot(&self, doc: &Doc) -> Option<DocSnapshot> {
        let snapshot = doc.to_snapshot()?;

        Self::walk(&snapshot, |block| {
            let Some(id) = block.source_id() else {
                return;
            };
            if self.assets.contains(id) {
                return;
            }
            match self.collection.blob(id) {
                Some(asset) => self.assets.insert(id, asset),
                None => {
                    debug!(target: "docpack::export", doc_id = doc.id(), asset_id = id, "Referenced blob missing from collection");
                }
            }
        });

        Some(snapshot)
    }

    /// Rebuild a doc from a snapshot
    ///
    /// Runs every middleware's `before_import`, builds the doc, then runs
    /// every `after_import`. Nothing is written to the collection; see
    /// [`Job::store_doc`].
    ///
    /// # Errors
    ///
    /// Returns the first middleware error.
    pub fn snapshot_to_doc(
        &self,
        mut snapshot: DocSnapshot,
        ctx: &ImportContext<'_>,
    ) -> CoreResult<Doc> {
        for middleware in &self.middlewares {
            trace!(target: "docpack::import", middleware = middleware.name(), doc_id = snapshot.id(), "before_import");
            middleware.before_import(ctx, &mut snapshot)?;
        }

        let kind = snapshot.kind;
        let mut doc = Doc::from(snapshot);
        for middleware in &self.middlewares {
            trace!(target: "docpack::import", middleware = middleware.name(), doc_id = doc.id(), "after_import");
            middleware.after_import(ctx, ImportPayload { kind, doc: &mut doc })?;
        }

        Ok(doc)
    }

    /// Upload the assets a doc references, then insert the doc
    ///
    /// References missing from the job's asset map are kept as they are.
    ///
    /// # Errors
    ///
    /// Returns the first upload or insert error.
    pub fn store_doc(&self, doc: &Doc) -> CoreResult<()> {
        let mut uploads = Vec::new();
        if let Some(root) = &doc.root {
            root.walk(&mut |block: &Block| {
                if let Some(id) = block.source_id() {
                    uploads.push(id.to_string());
                }
            });
        }

        for id in uploads {
            match self.assets.get(&id) {
                Some(asset) => self.collection.put_blob(&id, asset)?,
                None => {
                    debug!(target: "docpack::import", doc_id = doc.id(), asset_id = %id, "Unresolved asset reference kept");
                }
            }
        }

        self.collection.insert_doc(doc.clone())
    }

    /// Visit every block of a snapshot, pre-order
    pub fn walk<'a>(snapshot: &'a DocSnapshot, visitor: impl FnMut(&'a Block)) {
        snapshot.walk(visitor);
    }
}
