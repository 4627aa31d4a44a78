//! Facade smoke tests
//!
//! Drives the public API through the `docpack` crate only, the way a host
//! application would: configure, export to disk, inspect, import.

use docpack::archive::ArchiveFormat;
use docpack::{
    export_docs_to_file, import_docs_from_file, inspect_archive, Asset, Block, DocCollection,
    MemoryCollection, TransformerConfig, CONFIG_FILE_NAME,
};
use tempfile::TempDir;

#[test]
fn test_configured_export_and_import() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&config_path, "format = \"tar.zst\"\n").unwrap();
    let options = TransformerConfig::from_file(&config_path)
        .unwrap()
        .export_options()
        .unwrap();

    let source = MemoryCollection::new("notes", 2);
    source
        .put_blob("logo", Asset::new(b"\x89PNG fake".to_vec(), "image/png"))
        .unwrap();
    source
        .create_doc(
            "welcome",
            "Welcome",
            Block::new("root", "affine:page")
                .with_child(Block::new("logo-block", "affine:image").with_prop("sourceId", "logo")),
        )
        .unwrap();

    let archive_path = dir.path().join("notes.tar.zst");
    let export = export_docs_to_file(&source, &source.docs(), &archive_path, &options).unwrap();
    assert_eq!(export.format, ArchiveFormat::TarZst);

    let summary = inspect_archive(&std::fs::read(&archive_path).unwrap()).unwrap();
    let info: serde_json::Value = serde_json::to_value(summary.info.unwrap()).unwrap();
    assert_eq!(info["pageVersion"], 2);
    assert_eq!(info["type"], "info");

    let dest = MemoryCollection::new("copy", 2);
    let docs = import_docs_from_file(&dest, &archive_path).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(dest.blob_ids().len(), 1);
    assert!(dest.has_doc("welcome"));
}
