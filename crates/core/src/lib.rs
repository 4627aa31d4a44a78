//! Core types and traits for docpack
//!
//! This crate defines the foundational types used throughout the system:
//! - CollectionInfo, DocSnapshot, Block: the on-archive JSON model
//! - Doc: the in-collection form of a document
//! - Asset, AssetMap: binary payloads and the job-owned asset table
//! - content_hash: SHA-256 content addressing for assets
//! - DocCollection, JobMiddleware: capability traits supplied by the host
//! - CoreError: error type for the document model

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asset;
pub mod error;
pub mod traits;
pub mod types;

pub use asset::{
    content_hash, extension_for_mime, mime_for_extension, Asset, AssetMap,
    EXT_MIME_TABLE,
};
pub use error::{CoreError, CoreResult};
pub use traits::{DocCollection, ImportContext, ImportPayload, JobMiddleware, UpgradeOptions};
pub use types::{
    Block, BlockKind, CollectionInfo, Doc, DocMeta, DocSnapshot, InfoKind, SnapshotKind,
    PAGE_ID_PROP, SOURCE_ID_PROP,
};
