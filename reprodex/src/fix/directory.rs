//! Directory-tree fix mode

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::dex::MapId;
use crate::error::Result;
use crate::utils::parent_dir;

use super::{FixSummary, PROFILE_ENTRY, is_dex_target, rewrite_targets};

/// Rewrites `classes*.dex` at the root of `input` plus the baseline profile
/// when one exists, writing the fixed files as a fresh tree at `output`.
///
/// The tree is staged in the output's parent directory and swapped into
/// place only once complete; an existing output path is replaced.
pub fn fix_directory(input: &Path, output: &Path, map_id: &MapId) -> Result<FixSummary> {
    let mut targets: IndexMap<String, Vec<u8>> = IndexMap::new();

    let profile_path = input.join(PROFILE_ENTRY);
    if profile_path.is_file() {
        tracing::info!("reading '{PROFILE_ENTRY}'");
        targets.insert(PROFILE_ENTRY.to_string(), fs::read(&profile_path)?);
    } else {
        tracing::debug!("no '{PROFILE_ENTRY}' present");
    }

    let mut dex_names = Vec::new();
    for entry in fs::read_dir(input)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_dex_target(&name) && entry.path().is_file() {
            dex_names.push(name);
        }
    }
    dex_names.sort();
    for name in dex_names {
        tracing::info!("reading '{name}'");
        let data = fs::read(input.join(&name))?;
        targets.insert(name, data);
    }

    let summary = rewrite_targets(&mut targets, map_id)?;
    write_tree(output, &targets)?;
    Ok(summary)
}

fn write_tree(output: &Path, targets: &IndexMap<String, Vec<u8>>) -> Result<()> {
    let staging = tempfile::TempDir::with_prefix_in(".reprodex-", parent_dir(output))?;
    let staged_root = staging.path().join("out");
    fs::create_dir(&staged_root)?;
    for (name, data) in targets {
        tracing::info!("writing '{name}'");
        let dest = staged_root.join(name);
        if let Some(dir) = dest.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&dest, data)?;
    }
    if output.is_dir() {
        fs::remove_dir_all(output)?;
    } else if output.exists() {
        fs::remove_file(output)?;
    }
    fs::rename(&staged_root, output)?;
    Ok(())
}
