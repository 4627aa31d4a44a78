//! In-memory document collection
//!
//! `MemoryCollection` is a thread-safe `DocCollection` for hosts without a
//! storage backend and for tests. Documents live in a `BTreeMap` behind a
//! `parking_lot::RwLock`; blobs live in a `DashMap`.

use docpack_core::{
    Asset, Block, CollectionInfo, CoreError, CoreResult, Doc, DocCollection, DocMeta,
    UpgradeOptions,
};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Schema upgrade hook: `(from_version, options, doc)`
pub type UpgradeHook = Box<dyn Fn(u32, &UpgradeOptions, &mut Doc) -> CoreResult<()> + Send + Sync>;

/// Thread-safe in-memory collection
pub struct MemoryCollection {
    info: CollectionInfo,
    docs: RwLock<BTreeMap<String, Doc>>,
    blobs: DashMap<String, Asset>,
    upgrade: Option<UpgradeHook>,
}

impl std::fmt::Debug for MemoryCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCollection")
            .field("info", &self.info)
            .field("docs", &self.docs.read().len())
            .field("blobs", &self.blobs.len())
            .field("upgrade", &self.upgrade.is_some())
            .finish()
    }
}

impl MemoryCollection {
    /// Create an empty collection at the given page schema version
    pub fn new(id: impl Into<String>, page_version: u32) -> Self {
        Self {
            info: CollectionInfo::new(id, page_version),
            docs: RwLock::new(BTreeMap::new()),
            blobs: DashMap::new(),
            upgrade: None,
        }
    }

    /// Install a schema upgrade hook
    ///
    /// Without a hook `upgrade_doc` leaves documents unchanged.
    pub fn with_upgrade_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(u32, &UpgradeOptions, &mut Doc) -> CoreResult<()> + Send + Sync + 'static,
    {
        self.upgrade = Some(Box::new(hook));
        self
    }

    /// Create and store a new doc stamped with the current time
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DocAlreadyExists` if the id is taken.
    pub fn create_doc(
        &self,
        id: impl Into<String>,
        title: impl Into<String>,
        root: Block,
    ) -> CoreResult<Doc> {
        let mut meta = DocMeta::new(id, title);
        meta.create_date = chrono::Utc::now().timestamp_millis();
        let doc = Doc::new(meta, root);
        self.insert_doc(doc.clone())?;
        Ok(doc)
    }

    /// All documents, ordered by id
    pub fn docs(&self) -> Vec<Doc> {
        self.docs.read().values().cloned().collect()
    }

    /// All document ids, sorted
    pub fn doc_ids(&self) -> Vec<String> {
        self.docs.read().keys().cloned().collect()
    }

    /// All blob ids, sorted
    pub fn blob_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.blobs.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// True when the collection holds no documents
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

impl DocCollection for MemoryCollection {
    fn info(&self) -> CollectionInfo {
        self.info.clone()
    }

    fn doc(&self, id: &str) -> Option<Doc> {
        self.docs.read().get(id).cloned()
    }

    fn has_doc(&self, id: &str) -> bool {
        self.docs.read().contains_key(id)
    }

    fn insert_doc(&self, doc: Doc) -> CoreResult<()> {
        let mut docs = self.docs.write();
        if docs.contains_key(doc.id()) {
            return Err(CoreError::DocAlreadyExists(doc.id().to_string()));
        }
        docs.insert(doc.id().to_string(), doc);
        Ok(())
    }

    fn blob(&self, id: &str) -> Option<Asset> {
        self.blobs.get(id).map(|e| e.value().clone())
    }

    fn put_blob(&self, id: &str, asset: Asset) -> CoreResult<()> {
        self.blobs.insert(id.to_string(), asset);
        Ok(())
    }

    fn upgrade_doc(
        &self,
        from_version: u32,
        options: &UpgradeOptions,
        doc: &mut Doc,
    ) -> CoreResult<()> {
        match &self.upgrade {
            Some(hook) => hook(from_version, options, doc),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_insert_and_lookup() {
        let collection = MemoryCollection::new("ws", 3);
        assert!(collection.is_empty());
        assert_eq!(collection.info().page_version, Some(3));

        let doc = collection
            .create_doc("d1", "First", Block::new("r", "affine:page"))
            .unwrap();
        assert!(doc.meta.create_date > 0);
        assert!(collection.has_doc("d1"));
        assert_eq!(collection.doc("d1"), Some(doc));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let collection = MemoryCollection::new("ws", 1);
        collection
            .create_doc("d1", "", Block::new("r", "affine:page"))
            .unwrap();
        let err = collection
            .create_doc("d1", "", Block::new("r", "affine:page"))
            .unwrap_err();
        assert!(matches!(err, CoreError::DocAlreadyExists(id) if id == "d1"));
    }

    #[test]
    fn test_blobs_overwrite() {
        let collection = MemoryCollection::new("ws", 1);
        collection
            .put_blob("b", Asset::new(b"one".to_vec(), ""))
            .unwrap();
        collection
            .put_blob("b", Asset::new(b"two".to_vec(), ""))
            .unwrap();
        assert_eq!(collection.blob("b").unwrap().data(), b"two");
        assert_eq!(collection.blob_ids(), vec!["b"]);
    }

    #[test]
    fn test_upgrade_hook_is_called() {
        let collection = MemoryCollection::new("ws", 5).with_upgrade_hook(|from, _, doc| {
            doc.meta.tags.push(format!("from-{}", from));
            Ok(())
        });
        let mut doc = Doc::new(DocMeta::new("d", ""), Block::new("r", "affine:page"));
        collection
            .upgrade_doc(2, &UpgradeOptions::default(), &mut doc)
            .unwrap();
        assert_eq!(doc.meta.tags, vec!["from-2"]);
    }

    #[test]
    fn test_upgrade_without_hook_is_noop() {
        let collection = MemoryCollection::new("ws", 5);
        let mut doc = Doc::new(DocMeta::new("d", "t"), Block::new("r", "affine:page"));
        let before = doc.clone();
        collection
            .upgrade_doc(0, &UpgradeOptions::default(), &mut doc)
            .unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_concurrent_inserts() {
        let collection = Arc::new(MemoryCollection::new("ws", 1));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let collection = Arc::clone(&collection);
                thread::spawn(move || {
                    for i in 0..25 {
                        collection
                            .create_doc(format!("t{}-{}", t, i), "", Block::new("r", "affine:page"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(collection.len(), 200);
    }
}
