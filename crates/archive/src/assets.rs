//! Asset archiver
//!
//! Stages the whitelisted subset of an asset map under `assets/<id>.<ext>`.

use crate::error::ArchiveResult;
use crate::types::{paths, WriteOptions};
use crate::writer::ArchiveWriter;
use docpack_core::{Asset, AssetMap};
use tracing::debug;

/// Entry file name for an asset, relative to `assets/`
pub fn asset_file_name(id: &str, asset: &Asset) -> String {
    format!("{}.{}", id, asset.extension())
}

/// Write whitelisted assets into `writer`, in whitelist order
///
/// Ids missing from `assets` are skipped. Returns the number of assets
/// actually staged.
pub fn stage_assets<S: AsRef<str>>(writer: &mut ArchiveWriter, assets: &AssetMap, ids: &[S]) -> usize {
    let mut dir = writer.directory(paths::ASSETS_DIR);
    let mut staged = 0;

    for id in ids {
        let id: &str = id.as_ref();
        let Some(asset) = assets.get(id) else {
            debug!(target: "docpack::archive", asset_id = id, "Whitelisted asset not in asset map");
            continue;
        };
        if dir.add_entry(&asset_file_name(id, &asset), asset.data()) {
            staged += 1;
        }
    }

    staged
}

/// Open a writer and stage the whitelisted assets into it
///
/// The returned writer is positioned after the assets; the caller adds the
/// remaining entries and finalizes.
pub fn create_assets_archive<S: AsRef<str>>(
    assets: &AssetMap,
    ids: &[S],
    options: &WriteOptions,
) -> ArchiveResult<ArchiveWriter> {
    let mut writer = ArchiveWriter::new(options)?;
    stage_assets(&mut writer, assets, ids);
    Ok(writer)
}
