//! Document archive transformer
//!
//! This crate moves documents between a `DocCollection` and an archive:
//! - Job: doc ↔ snapshot conversion with asset tracking
//! - Middlewares: id replacement, schema migration, title fix-up
//! - Export/import orchestration, archive inspection, file helpers
//! - `docpack.toml` configuration
//! - `MemoryCollection`, an in-memory backend
//!
//! The engine is the only component that knows about:
//! - Content-hash re-keying of bundled assets
//! - Middleware ordering on import

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod job;
pub mod memory;
pub mod middleware;
pub mod transformer;

pub use config::{TransformerConfig, CONFIG_FILE_NAME};
pub use error::{EngineError, EngineResult};
pub use job::Job;
pub use memory::{MemoryCollection, UpgradeHook};
pub use middleware::{
    import_middlewares, MigrationMiddleware, ReplaceIdMiddleware, TitleMiddleware, UNTITLED,
};
pub use transformer::{
    export_docs, export_docs_to_file, export_docs_with_options, import_docs,
    import_docs_from_file, inspect_archive, ArchiveSummary, ExportInfo, ExportOptions,
    BUNDLED_ASSET_MARKER,
};
