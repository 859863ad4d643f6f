//! Baseline profile checksum rewriting

use std::collections::HashMap;

use crate::error::Result;

use super::BaselineProfile;

/// Patches each record whose key appears in `crcs` with the new dex
/// checksum, then re-serializes the whole profile.
///
/// Records whose key matches nothing in `crcs` pass through unmodified.
/// The profile is re-serialized even when every checksum already matched,
/// so the output stream always carries the fixed compression level.
pub fn fix_dex_checksums(data: &[u8], crcs: &HashMap<String, u32>) -> Result<Vec<u8>> {
    let mut profile = BaselineProfile::parse(data)?;
    for record in &mut profile.records {
        if let Some(&crc) = crcs.get(&record.profile_key) {
            if crc != record.dex_checksum {
                tracing::info!(
                    "fixing '{}' checksum: {:#x} -> {:#x}",
                    record.profile_key,
                    record.dex_checksum,
                    crc
                );
            }
            record.dex_checksum = crc;
        }
    }
    profile.to_bytes()
}
