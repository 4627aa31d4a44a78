//! Archive entry classification
//!
//! Every entry name maps to exactly one `EntryKind`, decided once while the
//! archive is iterated.

use crate::types::{paths, PLATFORM_ARTIFACT_MARKERS};

/// What an archive entry holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// `info.json`
    Metadata,
    /// `<docId>.snapshot.json`
    Snapshot,
    /// `assets/<id>.<ext>`
    Asset(AssetEntry),
    /// Platform junk, directory markers, or names nothing consumes
    Ignored,
}

/// Identity of an asset entry, derived from its path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// Path relative to `assets/`
    pub file_name: String,
    /// File name without its last extension
    pub id: String,
    /// Last extension, `""` if none
    pub extension: String,
}

impl AssetEntry {
    /// Parse the part of an entry path after `assets/`
    ///
    /// Only a trailing `.<ext>` with no `/` or `.` inside the extension is
    /// stripped, so `sub/x.png` → id `sub/x` and `a.b.png` → id `a.b`.
    pub fn parse(file_name: &str) -> Self {
        let split = file_name
            .rfind('.')
            .filter(|&dot| dot + 1 < file_name.len() && !file_name[dot + 1..].contains('/'));
        let (id, extension) = match split {
            Some(dot) => (&file_name[..dot], &file_name[dot + 1..]),
            None => (file_name, ""),
        };
        Self {
            file_name: file_name.to_string(),
            id: id.to_string(),
            extension: extension.to_string(),
        }
    }
}

/// Whether a name belongs to OS metadata rather than the document set
pub fn is_platform_artifact(name: &str) -> bool {
    PLATFORM_ARTIFACT_MARKERS
        .iter()
        .any(|marker| name.contains(marker))
}

/// Classify an entry name
pub fn classify(name: &str) -> EntryKind {
    if is_platform_artifact(name) {
        return EntryKind::Ignored;
    }

    if let Some(file_name) = name.strip_prefix(paths::ASSETS_PREFIX) {
        if file_name.is_empty() || file_name.ends_with('/') {
            return EntryKind::Ignored;
        }
        return EntryKind::Asset(AssetEntry::parse(file_name));
    }

    if name == paths::INFO {
        return EntryKind::Metadata;
    }

    if name.ends_with(paths::SNAPSHOT_SUFFIX) {
        return EntryKind::Snapshot;
    }

    EntryKind::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_classify_layout() {
        assert_eq!(classify("info.json"), EntryKind::Metadata);
        assert_eq!(classify("doc-1.snapshot.json"), EntryKind::Snapshot);
        assert_eq!(
            classify("assets/abc.png"),
            EntryKind::Asset(AssetEntry {
                file_name: "abc.png".to_string(),
                id: "abc".to_string(),
                extension: "png".to_string(),
            })
        );
    }

    #[test]
    fn test_classify_ignored() {
        assert_eq!(classify("__MACOSX/._info.json"), EntryKind::Ignored);
        assert_eq!(classify("__MACOSX/doc.snapshot.json"), EntryKind::Ignored);
        assert_eq!(classify(".DS_Store"), EntryKind::Ignored);
        assert_eq!(classify("assets/.DS_Store"), EntryKind::Ignored);
        assert_eq!(classify("assets/"), EntryKind::Ignored);
        assert_eq!(classify("README.md"), EntryKind::Ignored);
        assert_eq!(classify("nested/info.json"), EntryKind::Ignored);
    }

    #[test]
    fn test_asset_entry_parse() {
        let e = AssetEntry::parse("a.b.png");
        assert_eq!((e.id.as_str(), e.extension.as_str()), ("a.b", "png"));

        let e = AssetEntry::parse("noext");
        assert_eq!((e.id.as_str(), e.extension.as_str()), ("noext", ""));

        let e = AssetEntry::parse("sub/x.png");
        assert_eq!((e.id.as_str(), e.extension.as_str()), ("sub/x", "png"));

        let e = AssetEntry::parse("dir.v2/file");
        assert_eq!((e.id.as_str(), e.extension.as_str()), ("dir.v2/file", ""));

        let e = AssetEntry::parse("trailing.");
        assert_eq!((e.id.as_str(), e.extension.as_str()), ("trailing.", ""));
    }

    proptest! {
        #[test]
        fn platform_markers_always_ignored(prefix in "[a-z/]{0,8}", suffix in "[a-z./]{0,12}") {
            for marker in PLATFORM_ARTIFACT_MARKERS {
                let name = format!("{}{}{}", prefix, marker, suffix);
                prop_assert_eq!(classify(&name), EntryKind::Ignored);
            }
        }

        #[test]
        fn asset_id_plus_extension_rebuilds_name(id in "[a-zA-Z0-9_-]{1,16}", ext in "[a-z0-9]{1,5}") {
            let entry = AssetEntry::parse(&format!("{}.{}", id, ext));
            prop_assert_eq!(entry.id, id);
            prop_assert_eq!(entry.extension, ext);
        }
    }
}
