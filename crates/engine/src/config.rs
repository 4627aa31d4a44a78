//! Transformer configuration via `docpack.toml`
//!
//! Hosts that want to tune export behaviour without code changes keep a
//! `docpack.toml` next to their data and load it with
//! [`TransformerConfig::from_file`].

use crate::error::{EngineError, EngineResult};
use crate::transformer::ExportOptions;
use docpack_archive::{ArchiveFormat, WriteOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "docpack.toml";

/// Transformer configuration loaded from `docpack.toml`.
///
/// # Example
///
/// ```toml
/// format = "zip"
/// compression_level = 3
/// mark_bundled_assets = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransformerConfig {
    /// Archive container: `"zip"` or `"tar.zst"`.
    #[serde(default = "default_format_str")]
    pub format: String,
    /// zstd level (1-22) used for `"tar.zst"`.
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
    /// Write bundled asset references as `/<id>` so importers content-address them.
    #[serde(default = "default_true")]
    pub mark_bundled_assets: bool,
}

fn default_format_str() -> String {
    "zip".to_string()
}

fn default_compression_level() -> i32 {
    3
}

fn default_true() -> bool {
    true
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            format: default_format_str(),
            compression_level: default_compression_level(),
            mark_bundled_assets: true,
        }
    }
}

impl TransformerConfig {
    /// Parse the format string into an `ArchiveFormat`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"zip"` or `"tar.zst"`.
    pub fn archive_format(&self) -> EngineResult<ArchiveFormat> {
        self.format
            .parse()
            .map_err(|e: String| EngineError::config(format!("{} in {}", e, CONFIG_FILE_NAME)))
    }

    /// Build export options from this config.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown format or a compression level outside 1-22.
    pub fn export_options(&self) -> EngineResult<ExportOptions> {
        let format = self.archive_format()?;
        if !(1..=22).contains(&self.compression_level) {
            return Err(EngineError::config(format!(
                "compression_level {} out of range 1-22 in {}",
                self.compression_level, CONFIG_FILE_NAME
            )));
        }
        Ok(ExportOptions {
            write: WriteOptions {
                format,
                compression_level: self.compression_level,
            },
            mark_bundled_assets: self.mark_bundled_assets,
        })
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# docpack archive configuration
#
# Archive container: "zip" (default) or "tar.zst"
format = "zip"

# zstd compression level for "tar.zst" archives (1-22, default 3)
compression_level = 3

# Rewrite references to bundled assets as "/<id>" so importers
# re-key them by content hash (default: true)
mark_bundled_assets = true
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        content.parse()
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> EngineResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }
}

impl FromStr for TransformerConfig {
    type Err = EngineError;

    /// Parse config from TOML text, validating values eagerly.
    fn from_str(content: &str) -> EngineResult<Self> {
        let config: TransformerConfig = toml::from_str(content)
            .map_err(|e| EngineError::config(format!("Failed to parse config: {}", e)))?;
        config.export_options()?;
        Ok(config)
    }
}
