//! Engine error types
//!
//! Import treats any unreadable entry as fatal; export failures that only
//! affect a single document or entry are reported in `ExportInfo` instead.

use docpack_archive::ArchiveError;
use docpack_core::CoreError;
use std::io;
use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by export, import and configuration
#[derive(Debug, Error)]
pub enum EngineError {
    /// Archive container error
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Document model or backend error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An archive entry holds malformed JSON
    #[error("Malformed entry '{entry}': {source}")]
    MalformedEntry {
        /// Entry path in the archive
        entry: String,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl EngineError {
    /// Create a malformed entry error
    pub fn malformed(entry: impl Into<String>, source: serde_json::Error) -> Self {
        Self::MalformedEntry {
            entry: entry.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_entry_names_the_entry() {
        let source = serde_json::from_slice::<serde_json::Value>(b"\xff\xfe").unwrap_err();
        let err = EngineError::malformed("doc-1.snapshot.json", source);
        assert!(err.to_string().contains("doc-1.snapshot.json"));
    }

    #[test]
    fn test_conversions() {
        let err: EngineError = ArchiveError::archive("bad").into();
        assert!(matches!(err, EngineError::Archive(_)));

        let err: EngineError = CoreError::DocAlreadyExists("x".to_string()).into();
        assert!(matches!(err, EngineError::Core(_)));
        assert!(err.to_string().contains("x"));
    }
}
