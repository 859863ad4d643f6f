//! Baseline profile reader

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;

use crate::error::{Error, Result};

use super::{
    BaselineProfile, DexRecord, HEADER_LEN, PROF_MAGIC, PROF_VERSION_010_P, RECORD_FIXED_LEN,
};

impl BaselineProfile {
    /// Parses a serialized profile, validating both declared sizes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::ProfTruncated { len: data.len() });
        }

        let mut cursor = Cursor::new(data);
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        if magic != PROF_MAGIC {
            return Err(Error::InvalidProfMagic(magic));
        }
        let mut version = [0u8; 4];
        cursor.read_exact(&mut version)?;
        if version != PROF_VERSION_010_P {
            return Err(Error::UnsupportedProfVersion { version });
        }
        tracing::debug!("prof version=010 P");

        let num_dex_files = cursor.read_u8()?;
        let uncompressed_data_size = cursor.read_u32::<LittleEndian>()?;
        let compressed_data_size = cursor.read_u32::<LittleEndian>()?;

        let stream = &data[HEADER_LEN..];
        if stream.len() as u64 != u64::from(compressed_data_size) {
            return Err(Error::ProfSizeMismatch {
                field: "compressed data",
                declared: u64::from(compressed_data_size),
                actual: stream.len() as u64,
            });
        }

        let mut decompressed = Vec::with_capacity(uncompressed_data_size as usize);
        ZlibDecoder::new(stream)
            .read_to_end(&mut decompressed)
            .map_err(|err| Error::ZlibDecompressionFailed {
                message: err.to_string(),
            })?;
        if decompressed.len() as u64 != u64::from(uncompressed_data_size) {
            return Err(Error::ProfSizeMismatch {
                field: "uncompressed data",
                declared: u64::from(uncompressed_data_size),
                actual: decompressed.len() as u64,
            });
        }

        let (records, consumed) = parse_records(&decompressed, usize::from(num_dex_files))?;
        let trailing = decompressed[consumed..].to_vec();
        Ok(BaselineProfile { records, trailing })
    }
}

/// Parses the record table, returning the records and the bytes consumed.
fn parse_records(data: &[u8], num_dex_files: usize) -> Result<(Vec<DexRecord>, usize)> {
    let mut records = Vec::with_capacity(num_dex_files);
    let mut offset = 0usize;
    for index in 0..num_dex_files {
        let remaining = data.len() - offset;
        if remaining < RECORD_FIXED_LEN {
            return Err(Error::ProfRecordTruncated {
                index,
                needed: RECORD_FIXED_LEN,
                remaining,
            });
        }
        let mut cursor = Cursor::new(&data[offset..offset + RECORD_FIXED_LEN]);
        let profile_key_size = cursor.read_u16::<LittleEndian>()?;
        let num_type_ids = cursor.read_u16::<LittleEndian>()?;
        let hot_method_region_size = cursor.read_u32::<LittleEndian>()?;
        let dex_checksum = cursor.read_u32::<LittleEndian>()?;
        let num_method_ids = cursor.read_u32::<LittleEndian>()?;
        offset += RECORD_FIXED_LEN;

        let key_len = usize::from(profile_key_size);
        if data.len() - offset < key_len {
            return Err(Error::ProfSizeMismatch {
                field: "profile key",
                declared: key_len as u64,
                actual: (data.len() - offset) as u64,
            });
        }
        let profile_key = std::str::from_utf8(&data[offset..offset + key_len])
            .map_err(|_| Error::ProfKeyNotUtf8 { index })?
            .to_string();
        offset += key_len;

        records.push(DexRecord {
            profile_key,
            num_type_ids,
            hot_method_region_size,
            dex_checksum,
            num_method_ids,
        });
    }
    Ok((records, offset))
}
