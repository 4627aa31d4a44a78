//! Binary assets and content addressing
//!
//! Assets are shared byte payloads (`Arc<[u8]>`) so that re-keying an asset
//! under its content hash never copies the bytes.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Extension → mime type table used when rebuilding assets from an archive
///
/// The first extension listed for a mime type is its canonical extension.
pub const EXT_MIME_TABLE: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("bmp", "image/bmp"),
    ("ico", "image/x-icon"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("avif", "image/avif"),
    ("heic", "image/heic"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("js", "application/javascript"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
];

/// Mime type for a file extension, or `""` when the extension is unknown
pub fn mime_for_extension(ext: &str) -> &'static str {
    let ext = ext.to_ascii_lowercase();
    EXT_MIME_TABLE
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or("")
}

/// Canonical extension for a mime type, if the table knows it
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    EXT_MIME_TABLE
        .iter()
        .find(|(_, m)| *m == mime)
        .map(|(ext, _)| *ext)
}

/// Content hash of a byte buffer
///
/// SHA-256, encoded as URL-safe base64 with padding (44 characters). Equal
/// bytes always produce equal hashes, which is what deduplicates assets
/// imported from different archives.
pub fn content_hash(data: &[u8]) -> String {
    URL_SAFE.encode(Sha256::digest(data))
}

/// A binary payload with its declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    data: Arc<[u8]>,
    mime: String,
    name: Option<String>,
}

impl Asset {
    /// Create an asset from bytes and a mime type (may be empty)
    pub fn new(data: impl Into<Arc<[u8]>>, mime: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime: mime.into(),
            name: None,
        }
    }

    /// Builder: attach a file name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Raw bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Declared mime type, `""` if unknown
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Original file name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for zero-byte payloads
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Content hash of the payload
    pub fn content_hash(&self) -> String {
        content_hash(&self.data)
    }

    /// File extension for this asset
    ///
    /// The file name's last dotted segment wins; otherwise the mime type
    /// decides (table lookup, then the mime subtype); otherwise `blob`.
    pub fn extension(&self) -> String {
        if let Some((_, ext)) = self.name.as_deref().and_then(|n| n.rsplit_once('.')) {
            return ext.to_string();
        }
        if let Some(ext) = extension_for_mime(&self.mime) {
            return ext.to_string();
        }
        match self.mime.rsplit_once('/') {
            Some((_, subtype)) if !subtype.is_empty() => subtype.to_string(),
            _ => "blob".to_string(),
        }
    }
}

/// Concurrent `id → Asset` table owned by a conversion job
///
/// Insertion is the only mutation. Lookups return clones (cheap: the payload
/// is shared), so no shard lock outlives a call.
#[derive(Debug, Default)]
pub struct AssetMap {
    inner: DashMap<String, Asset>,
}

impl AssetMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an asset
    pub fn insert(&self, id: impl Into<String>, asset: Asset) {
        self.inner.insert(id.into(), asset);
    }

    /// Look up an asset by id
    pub fn get(&self, id: &str) -> Option<Asset> {
        self.inner.get(id).map(|entry| entry.value().clone())
    }

    /// Whether an id is present
    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }

    /// All ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True when no assets are tracked
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Re-key an asset under the hash of its bytes
    ///
    /// Returns the hash, or `None` when `id` is not in the map. The original
    /// entry is kept. Inserting identical bytes twice lands on the same key.
    pub fn rekey_by_content(&self, id: &str) -> Option<String> {
        let asset = self.get(id)?;
        let hash = asset.content_hash();
        self.inner.insert(hash.clone(), asset);
        Some(hash)
    }
}
