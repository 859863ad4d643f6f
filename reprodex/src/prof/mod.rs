//! ART baseline profile handling
//!
//! The `010 P` profile format is a 17-byte header followed by one zlib
//! stream. The stream opens with a table of per-dex records; each record
//! stores the CRC-32 of the dex entry it profiles, which is why rewriting a
//! dex requires rewriting the profile alongside it. Everything after the
//! record table (hot method and class data) is carried through opaquely.

pub mod fixer;
pub mod reader;
pub mod writer;

pub use fixer::fix_dex_checksums;

/// First four bytes of every profile.
pub const PROF_MAGIC: [u8; 4] = *b"pro\0";

/// Version tag of the one supported profile format, `010 P`.
pub const PROF_VERSION_010_P: [u8; 4] = *b"010\0";

/// Header length: magic, version, dex count, two declared sizes.
pub const HEADER_LEN: usize = 17;

/// Fixed-width prefix of a per-dex record.
pub const RECORD_FIXED_LEN: usize = 16;

/// The zlib level profiles are written at. The profile toolchain always
/// compresses at level 1, so re-serialization uses the same fixed level
/// instead of rediscovering one.
pub const PROFILE_COMPRESSION_LEVEL: u32 = 1;

/// One per-dex record from the profile line table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexRecord {
    /// Name of the dex entry this record profiles, e.g. `classes.dex`.
    pub profile_key: String,
    /// Type id count.
    pub num_type_ids: u16,
    /// Size of this dex's hot method region in the trailing data.
    pub hot_method_region_size: u32,
    /// CRC-32 of the dex entry's bytes.
    pub dex_checksum: u32,
    /// Method id count.
    pub num_method_ids: u32,
}

/// Parsed `010 P` baseline profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineProfile {
    /// Per-dex records, in file order.
    pub records: Vec<DexRecord>,
    /// Hot-method and class data after the record table, kept opaque.
    pub trailing: Vec<u8>,
}

impl BaselineProfile {
    /// Serialized length of the uncompressed record table plus trailing data.
    pub fn uncompressed_len(&self) -> usize {
        self.records
            .iter()
            .map(|record| RECORD_FIXED_LEN + record.profile_key.len())
            .sum::<usize>()
            + self.trailing.len()
    }
}
