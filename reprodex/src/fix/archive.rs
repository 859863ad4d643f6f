//! APK/ZIP fix mode

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use indexmap::IndexMap;
use zip::ZipArchive;

use crate::apk;
use crate::dex::MapId;
use crate::error::Result;

use super::{FixSummary, is_fix_target, rewrite_targets};

/// Rewrites the pg-map-id inside the APK at `input` and repackages it to
/// `output`, every non-target entry byte-for-byte.
pub fn fix_archive(input: &Path, output: &Path, map_id: &MapId) -> Result<FixSummary> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(input)?))?;
    let mut targets: IndexMap<String, Vec<u8>> = IndexMap::new();
    for index in 0..archive.len() {
        // Raw handle first: opening a decompressor here would reject entries
        // the fix never needs to read.
        let target = {
            let entry = archive.by_index_raw(index)?;
            let name = entry.name();
            is_fix_target(name).then(|| name.to_string())
        };
        if let Some(name) = target {
            tracing::info!("reading '{name}'");
            let mut entry = archive.by_index(index)?;
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            targets.insert(name, data);
        }
    }
    drop(archive);

    let summary = rewrite_targets(&mut targets, map_id)?;
    apk::repack(input, output, &targets)?;
    Ok(summary)
}
