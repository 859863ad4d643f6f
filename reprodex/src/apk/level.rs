//! Deflate level discovery
//!
//! Trial-compresses an entry's content at each candidate level and compares
//! the CRC-32 of the trial stream against the CRC-32 of the entry's original
//! compressed bytes. Streams never need to be kept: only their CRCs meet.
//!
//! Byte-identical trials require the same deflate implementation the Android
//! toolchain uses, which is why this crate pins flate2 to the zlib backend.

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::{Compression, CrcWriter};

use crate::error::Result;

/// Candidate deflate levels, ordered so the common release settings come
/// first.
pub const CANDIDATE_LEVELS: [u32; 4] = [9, 6, 4, 1];

/// Finds the candidate level whose deflate stream over `content` has the
/// CRC-32 `expected_crc`, or `None` when no candidate reproduces it.
pub fn deflate_level_for(content: &[u8], expected_crc: u32) -> Result<Option<u32>> {
    for level in CANDIDATE_LEVELS {
        let sink = CrcWriter::new(std::io::sink());
        let mut encoder = DeflateEncoder::new(sink, Compression::new(level));
        encoder.write_all(content)?;
        let sink = encoder.finish()?;
        if sink.crc().sum() == expected_crc {
            return Ok(Some(level));
        }
    }
    Ok(None)
}
