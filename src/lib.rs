//! docpack - Portable archives for document collections
//!
//! docpack moves a collection of block-tree documents and their binary
//! assets into a single archive and back. Import content-addresses every
//! bundled asset, so the same bytes land under the same id in any
//! destination.
//!
//! # Quick Start
//!
//! ```ignore
//! use docpack::{export_docs, import_docs, MemoryCollection};
//!
//! let source = MemoryCollection::new("workspace", 2);
//! let export = export_docs(&source, &source.docs())?;
//!
//! let dest = MemoryCollection::new("copy", 2);
//! let docs = import_docs(&dest, export.bytes)?;
//! ```
//!
//! # Architecture
//!
//! - `docpack_core`: document model, assets, backend traits
//! - `docpack_archive`: zip / tar.zst container reader and writer
//! - `docpack_engine`: export, import, middlewares, configuration

pub use docpack_archive as archive;
pub use docpack_core as model;

pub use docpack_core::{
    Asset, AssetMap, Block, CollectionInfo, CoreError, Doc, DocCollection, DocMeta, DocSnapshot,
    JobMiddleware, UpgradeOptions,
};
pub use docpack_engine::*;
