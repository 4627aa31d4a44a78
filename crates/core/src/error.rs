//! Error types for the document model
//!
//! Errors raised by `DocCollection` backends and by snapshot handling.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use thiserror::Error;

/// Result type alias for core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Error types for the document model
#[derive(Debug, Error)]
pub enum CoreError {
    /// A document with the same id is already stored
    #[error("Doc already exists: {0}")]
    DocAlreadyExists(String),

    /// Snapshot is structurally valid JSON but unusable
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Schema upgrade hook failed
    #[error("Upgrade from page version {from_version} failed: {reason}")]
    Upgrade {
        /// Version the document was upgraded from
        from_version: u32,
        /// Description of the failure
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Create an invalid snapshot error
    pub fn invalid_snapshot(msg: impl Into<String>) -> Self {
        Self::InvalidSnapshot(msg.into())
    }

    /// Create an upgrade error
    pub fn upgrade(from_version: u32, reason: impl Into<String>) -> Self {
        Self::Upgrade {
            from_version,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_snapshot("page-1: empty doc id");
        assert!(err.to_string().contains("page-1"));

        let err = CoreError::upgrade(3, "missing root");
        let msg = err.to_string();
        assert!(msg.contains("3"));
        assert!(msg.contains("missing root"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Json(_)));
    }
}
