//! High-level fix operations
//!
//! A fix run reads the rewrite targets out of a container (directory tree
//! or APK), rewrites the dex payloads, patches the baseline profile with
//! the rewritten entries' CRCs, and writes the result without disturbing
//! anything else.

pub mod archive;
pub mod directory;
pub mod inplace;

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::dex::{self, MapId};
use crate::error::Result;
use crate::prof;

pub use inplace::{KNOWN_COMMANDS, fix_in_place};

/// Container path of the baseline profile asset.
pub const PROFILE_ENTRY: &str = "assets/dexopt/baseline.prof";

lazy_static! {
    static ref CLASSES_DEX_RE: Regex =
        Regex::new(r"^classes\d*\.dex$").expect("valid pattern");
}

/// True for entry names the dex rewrite applies to (`classes.dex`,
/// `classes2.dex`, ...).
pub fn is_dex_target(name: &str) -> bool {
    CLASSES_DEX_RE.is_match(name)
}

/// True for any entry a fix run rewrites: dex targets plus the profile.
pub fn is_fix_target(name: &str) -> bool {
    is_dex_target(name) || name == PROFILE_ENTRY
}

/// Per-file outcomes of one fix run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixSummary {
    /// Files whose bytes changed.
    pub rewritten: Vec<String>,
    /// Files inspected and written back byte-identical.
    pub unchanged: Vec<String>,
}

impl FixSummary {
    fn record(&mut self, name: &str, modified: bool) {
        if modified {
            self.rewritten.push(name.to_string());
        } else {
            self.unchanged.push(name.to_string());
        }
    }

    /// Number of files inspected.
    pub fn total(&self) -> usize {
        self.rewritten.len() + self.unchanged.len()
    }
}

/// Rewrites the pg-map-id in a directory tree or APK.
///
/// The mode is picked once by input-path inspection: a directory gets the
/// loose-file treatment, anything else is opened as a ZIP archive.
pub fn fix_map_id(input: &Path, output: &Path, map_id: &MapId) -> Result<FixSummary> {
    if input.is_dir() {
        directory::fix_directory(input, output, map_id)
    } else {
        archive::fix_archive(input, output, map_id)
    }
}

/// Rewrites every target buffer in place and reports per-file outcomes.
///
/// Dex entries are fixed first so the profile can be patched with the
/// final CRCs.
pub(crate) fn rewrite_targets(
    targets: &mut IndexMap<String, Vec<u8>>,
    map_id: &MapId,
) -> Result<FixSummary> {
    let mut summary = FixSummary::default();
    let mut crcs: HashMap<String, u32> = HashMap::new();
    for (name, data) in targets.iter_mut() {
        if is_dex_target(name) {
            tracing::info!("fixing '{name}'");
            let fix = dex::fix_map_id(data, map_id)?;
            crcs.insert(name.clone(), crc32fast::hash(&fix.bytes));
            summary.record(name, fix.modified());
            *data = fix.bytes;
        }
    }
    if let Some(data) = targets.get_mut(PROFILE_ENTRY) {
        tracing::info!("fixing '{PROFILE_ENTRY}'");
        let fixed = prof::fix_dex_checksums(data, &crcs)?;
        summary.record(PROFILE_ENTRY, fixed != *data);
        *data = fixed;
    }
    Ok(summary)
}
