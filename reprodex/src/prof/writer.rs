//! Baseline profile writer

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::ZlibEncoder;

use crate::error::Result;

use super::{
    BaselineProfile, HEADER_LEN, PROF_MAGIC, PROF_VERSION_010_P, PROFILE_COMPRESSION_LEVEL,
};

impl BaselineProfile {
    /// Serializes the profile: record table and trailing data recompressed
    /// at the fixed profile level, under a rebuilt header.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut raw = Vec::with_capacity(self.uncompressed_len());
        for record in &self.records {
            raw.write_u16::<LittleEndian>(record.profile_key.len() as u16)?;
            raw.write_u16::<LittleEndian>(record.num_type_ids)?;
            raw.write_u32::<LittleEndian>(record.hot_method_region_size)?;
            raw.write_u32::<LittleEndian>(record.dex_checksum)?;
            raw.write_u32::<LittleEndian>(record.num_method_ids)?;
            raw.extend_from_slice(record.profile_key.as_bytes());
        }
        raw.extend_from_slice(&self.trailing);

        let mut encoder = ZlibEncoder::new(
            Vec::new(),
            Compression::new(PROFILE_COMPRESSION_LEVEL),
        );
        encoder.write_all(&raw)?;
        let compressed = encoder.finish()?;

        let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
        out.extend_from_slice(&PROF_MAGIC);
        out.extend_from_slice(&PROF_VERSION_010_P);
        out.write_u8(self.records.len() as u8)?;
        out.write_u32::<LittleEndian>(raw.len() as u32)?;
        out.write_u32::<LittleEndian>(compressed.len() as u32)?;
        out.extend_from_slice(&compressed);
        Ok(out)
    }
}
