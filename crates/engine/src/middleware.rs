//! Import middlewares
//!
//! `import_docs` installs these in a fixed order: id replacement, schema
//! migration, title fix-up.

use dashmap::{DashMap, DashSet};
use docpack_core::{
    CoreResult, DocSnapshot, ImportContext, ImportPayload, JobMiddleware, SnapshotKind,
    UpgradeOptions,
};
use tracing::debug;
use uuid::Uuid;

/// Title given to documents whose title is empty after trimming
pub const UNTITLED: &str = "Untitled";

/// Give colliding documents fresh ids
///
/// A document whose id already exists in the destination is imported under
/// a new UUID. `pageId` links to documents imported by the same call follow
/// the remap. Each id is decided once per import, before that document is
/// stored, so later documents see a consistent mapping.
///
/// Ids are also unique within one import: a second snapshot carrying an id
/// already claimed by this import gets a fresh UUID, and links keep pointing
/// at the first one.
#[derive(Debug, Default)]
pub struct ReplaceIdMiddleware {
    remapped: DashMap<String, String>,
    claimed: DashSet<String>,
}

impl ReplaceIdMiddleware {
    /// Create a middleware with an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Final id for an imported document id
    fn resolve(&self, ctx: &ImportContext<'_>, id: &str) -> String {
        if let Some(existing) = self.remapped.get(id) {
            return existing.value().clone();
        }
        let target = if ctx.collection.has_doc(id) {
            let fresh = Uuid::new_v4().to_string();
            debug!(target: "docpack::import", from = id, to = %fresh, "Remapping colliding doc id");
            fresh
        } else {
            id.to_string()
        };
        self.remapped
            .entry(id.to_string())
            .or_insert(target)
            .value()
            .clone()
    }
}

impl JobMiddleware for ReplaceIdMiddleware {
    fn name(&self) -> &'static str {
        "replace-id"
    }

    fn before_import(&self, ctx: &ImportContext<'_>, snapshot: &mut DocSnapshot) -> CoreResult<()> {
        let mut id = self.resolve(ctx, &snapshot.meta.id);
        if !self.claimed.insert(id.clone()) {
            let fresh = Uuid::new_v4().to_string();
            debug!(target: "docpack::import", from = %snapshot.meta.id, to = %fresh, "Remapping duplicate doc id within archive");
            self.claimed.insert(fresh.clone());
            id = fresh;
        }
        snapshot.meta.id = id;

        snapshot.walk_mut(|block| {
            let Some(linked) = block.page_id() else {
                return;
            };
            if !ctx.imported_ids.contains(linked) {
                return;
            }
            let target = self.resolve(ctx, linked);
            if target != linked {
                block.set_page_id(target);
            }
        });
        Ok(())
    }
}

/// Bring page documents up to the destination schema
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationMiddleware {
    from_version: u32,
}

impl MigrationMiddleware {
    /// Migrate from the archive's `pageVersion` (0 when unknown)
    pub fn new(from_version: u32) -> Self {
        Self { from_version }
    }

    /// Version handed to the upgrade hook
    pub fn from_version(&self) -> u32 {
        self.from_version
    }
}

impl JobMiddleware for MigrationMiddleware {
    fn name(&self) -> &'static str {
        "migration"
    }

    fn after_import(&self, ctx: &ImportContext<'_>, payload: ImportPayload<'_>) -> CoreResult<()> {
        match payload.kind {
            SnapshotKind::Page => {
                ctx.collection
                    .upgrade_doc(self.from_version, &UpgradeOptions::default(), payload.doc)
            }
        }
    }
}

/// Normalize document titles
///
/// Runs after migration, so a title rewritten by the upgrade hook is
/// normalized too.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleMiddleware;

impl JobMiddleware for TitleMiddleware {
    fn name(&self) -> &'static str {
        "title"
    }

    fn after_import(&self, _ctx: &ImportContext<'_>, payload: ImportPayload<'_>) -> CoreResult<()> {
        let meta = &mut payload.doc.meta;
        let trimmed = meta.title.trim();
        meta.title = if trimmed.is_empty() {
            UNTITLED.to_string()
        } else {
            trimmed.to_string()
        };
        Ok(())
    }
}

/// The import chain, in run order
pub fn import_middlewares(page_version: u32) -> Vec<Box<dyn JobMiddleware>> {
    vec![
        Box::new(ReplaceIdMiddleware::new()),
        Box::new(MigrationMiddleware::new(page_version)),
        Box::new(TitleMiddleware),
    ]
}
