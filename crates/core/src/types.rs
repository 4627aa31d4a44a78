//! Document model and snapshot types
//!
//! Snapshots are the backend-independent JSON form of a collection and its
//! documents. Field names follow the on-archive camelCase layout:
//!
//! ```text
//! info.json            { "type": "info", "id", "pageVersion", "workspaceVersion", "properties" }
//! <id>.snapshot.json   { "type": "page", "meta": {...}, "blocks": { "type": "block", ... } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Block property holding the id of an attached binary asset
pub const SOURCE_ID_PROP: &str = "sourceId";

/// Block property holding the id of a linked document
pub const PAGE_ID_PROP: &str = "pageId";

// =============================================================================
// info.json
// =============================================================================

/// Tag for the collection info record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InfoKind {
    /// The only collection info kind
    #[default]
    Info,
}

/// Collection-level metadata written once per archive
///
/// `page_version` is optional on decode: archives from older writers may
/// omit it, in which case migration starts from version 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    /// Record tag, always `"info"`
    #[serde(rename = "type", default)]
    pub kind: InfoKind,

    /// Collection id
    #[serde(default)]
    pub id: String,

    /// Schema version of page documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_version: Option<u32>,

    /// Schema version of the collection container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_version: Option<u32>,

    /// Other collection-wide attributes (tag options, display settings)
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl CollectionInfo {
    /// Create info for a collection at the given page version
    pub fn new(id: impl Into<String>, page_version: u32) -> Self {
        Self {
            kind: InfoKind::Info,
            id: id.into(),
            page_version: Some(page_version),
            workspace_version: None,
            properties: Map::new(),
        }
    }
}

// =============================================================================
// Blocks
// =============================================================================

/// Tag for block records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// The only block kind
    #[default]
    Block,
}

/// One node of a document's block tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    /// Record tag, always `"block"`
    #[serde(rename = "type", default)]
    pub kind: BlockKind,

    /// Block id, unique within its document
    pub id: String,

    /// Block flavour (e.g. `affine:paragraph`, `affine:image`)
    pub flavour: String,

    /// Flavour schema version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Flavour-specific properties
    #[serde(default)]
    pub props: Map<String, Value>,

    /// Child blocks in document order
    #[serde(default)]
    pub children: Vec<Block>,
}

impl Block {
    /// Create a block with no props and no children
    pub fn new(id: impl Into<String>, flavour: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Block,
            id: id.into(),
            flavour: flavour.into(),
            version: None,
            props: Map::new(),
            children: Vec::new(),
        }
    }

    /// Builder: set a property
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Builder: append a child
    pub fn with_child(mut self, child: Block) -> Self {
        self.children.push(child);
        self
    }

    /// The attached asset id, if this block carries one
    pub fn source_id(&self) -> Option<&str> {
        self.props.get(SOURCE_ID_PROP).and_then(Value::as_str)
    }

    /// Point this block at another asset id
    pub fn set_source_id(&mut self, id: impl Into<String>) {
        self.props
            .insert(SOURCE_ID_PROP.to_string(), Value::String(id.into()));
    }

    /// The linked document id, if this block links one
    pub fn page_id(&self) -> Option<&str> {
        self.props.get(PAGE_ID_PROP).and_then(Value::as_str)
    }

    /// Point this block at another document id
    pub fn set_page_id(&mut self, id: impl Into<String>) {
        self.props
            .insert(PAGE_ID_PROP.to_string(), Value::String(id.into()));
    }

    /// Visit this block and all descendants, pre-order
    pub fn walk<'a>(&'a self, visitor: &mut impl FnMut(&'a Block)) {
        visitor(self);
        for child in &self.children {
            child.walk(visitor);
        }
    }

    /// Visit this block and all descendants mutably, pre-order
    pub fn walk_mut(&mut self, visitor: &mut impl FnMut(&mut Block)) {
        visitor(self);
        for child in &mut self.children {
            child.walk_mut(visitor);
        }
    }
}

// =============================================================================
// <id>.snapshot.json
// =============================================================================

/// Identifying metadata of one document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocMeta {
    /// Document id
    pub id: String,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Creation time, milliseconds since the Unix epoch
    #[serde(default)]
    pub create_date: i64,

    /// Tag ids
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DocMeta {
    /// Create metadata with an id and title
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            create_date: 0,
            tags: Vec::new(),
        }
    }
}

/// Kind of document a snapshot describes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// A page document (the only kind subject to page schema upgrades)
    #[default]
    Page,
}

/// Serializable form of one document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocSnapshot {
    /// Snapshot tag
    #[serde(rename = "type", default)]
    pub kind: SnapshotKind,

    /// Document metadata
    pub meta: DocMeta,

    /// Root of the block tree
    pub blocks: Block,
}

impl DocSnapshot {
    /// Document id recorded in the snapshot
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// Visit every block, pre-order
    pub fn walk<'a>(&'a self, mut visitor: impl FnMut(&'a Block)) {
        self.blocks.walk(&mut visitor);
    }

    /// Visit every block mutably, pre-order
    pub fn walk_mut(&mut self, mut visitor: impl FnMut(&mut Block)) {
        self.blocks.walk_mut(&mut visitor);
    }

    /// All `sourceId` values in tree order, duplicates included
    pub fn source_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.walk(|block| {
            if let Some(id) = block.source_id() {
                ids.push(id);
            }
        });
        ids
    }
}

// =============================================================================
// Live documents
// =============================================================================

/// A document as stored in a collection
///
/// A doc whose `root` is `None` has not been initialized yet and cannot be
/// converted to a snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Doc {
    /// Document metadata
    pub meta: DocMeta,

    /// Root block of the document tree
    pub root: Option<Block>,
}

impl Doc {
    /// Create a doc with a root block
    pub fn new(meta: DocMeta, root: Block) -> Self {
        Self {
            meta,
            root: Some(root),
        }
    }

    /// Document id
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// Snapshot this doc, or `None` if it has no root block
    pub fn to_snapshot(&self) -> Option<DocSnapshot> {
        self.root.as_ref().map(|root| DocSnapshot {
            kind: SnapshotKind::Page,
            meta: self.meta.clone(),
            blocks: root.clone(),
        })
    }
}

impl From<DocSnapshot> for Doc {
    fn from(snapshot: DocSnapshot) -> Self {
        Self {
            meta: snapshot.meta,
            root: Some(snapshot.blocks),
        }
    }
}
