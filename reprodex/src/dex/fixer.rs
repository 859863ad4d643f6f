//! pg-map-id rewriting
//!
//! R8 embeds a build marker into dex string data carrying the 7-hex
//! `pg-map-id` of the proguard mapping it was built against. Replacing the
//! id is a textual rewrite of the body; the stored SHA-1 signature and
//! Adler-32 checksum are then recomputed over the new bytes.

use std::fmt;
use std::str::FromStr;

use adler::Adler32;
use byteorder::{LittleEndian, WriteBytesExt};
use lazy_static::lazy_static;
use regex::bytes::{Captures, Regex};
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};
use crate::utils::to_hex;

use super::{CHECKSUM_OFFSET, DexFile};

lazy_static! {
    // `.` must stay byte-wise and not cross newlines, hence (?-u) without (?s).
    static ref MARKER_RE: Regex =
        Regex::new(r#"(?-u)(~~R8\{"backend":"dex".*?"pg-map-id":")([0-9a-f]{7})(")"#)
            .expect("valid pattern");
}

/// A validated replacement pg-map-id: exactly 7 lowercase hex digits.
///
/// Any other shape is rejected up front. The marker sits inside dex string
/// data, so a different length would shift every offset recorded in the
/// header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapId(String);

impl MapId {
    /// Validates and wraps a replacement id.
    pub fn new(value: &str) -> Result<Self> {
        let valid = value.len() == 7
            && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if valid {
            Ok(MapId(value.to_string()))
        } else {
            Err(Error::InvalidMapId {
                value: value.to_string(),
            })
        }
    }

    /// The id as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as the bytes spliced into the marker.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for MapId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MapId::new(s)
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a pg-map-id rewrite over one DEX payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexFix {
    /// The payload after the rewrite; identical to the input when no marker
    /// changed.
    pub bytes: Vec<u8>,
    /// Number of markers whose id actually changed.
    pub replaced: usize,
}

impl DexFix {
    /// True when the payload bytes differ from the input.
    pub fn modified(&self) -> bool {
        self.replaced > 0
    }
}

/// Rewrites every pg-map-id marker in a DEX payload to `map_id` and
/// recomputes the dependent signature and checksum.
///
/// A payload without markers, or one already carrying `map_id` everywhere,
/// is returned byte-identical; the stored digests are left exactly as they
/// were so repeated runs converge.
pub fn fix_map_id(data: &[u8], map_id: &MapId) -> Result<DexFix> {
    let dex = DexFile::parse(data)?;
    tracing::debug!("dex version={}", dex.version_str());

    let mut replaced = 0usize;
    let fixed_body = MARKER_RE.replace_all(dex.body, |caps: &Captures<'_>| {
        let current = &caps[2];
        tracing::info!(
            "fixing pg-map-id: {} -> {}",
            String::from_utf8_lossy(current),
            map_id
        );
        if current != map_id.as_bytes() {
            replaced += 1;
        }
        let mut marker = Vec::with_capacity(caps[0].len());
        marker.extend_from_slice(&caps[1]);
        marker.extend_from_slice(map_id.as_bytes());
        marker.extend_from_slice(&caps[3]);
        marker
    });

    if replaced == 0 {
        tracing::info!("(not modified)");
        return Ok(DexFix {
            bytes: data.to_vec(),
            replaced: 0,
        });
    }

    let fixed_signature: [u8; 20] = Sha1::digest(&fixed_body).into();
    tracing::info!(
        "fixing signature: {} -> {}",
        to_hex(&dex.signature),
        to_hex(&fixed_signature)
    );

    let mut adler = Adler32::new();
    adler.write_slice(&fixed_signature);
    adler.write_slice(&fixed_body);
    let fixed_checksum = adler.checksum();
    tracing::info!(
        "fixing checksum: {:#x} -> {:#x}",
        dex.checksum,
        fixed_checksum
    );

    let mut bytes = Vec::with_capacity(data.len());
    bytes.extend_from_slice(&data[..CHECKSUM_OFFSET]);
    bytes.write_u32::<LittleEndian>(fixed_checksum)?;
    bytes.extend_from_slice(&fixed_signature);
    bytes.extend_from_slice(&fixed_body);
    Ok(DexFix { bytes, replaced })
}

/// Lists the pg-map-id of every marker in a payload, in order of appearance.
pub fn find_map_ids(data: &[u8]) -> Vec<String> {
    MARKER_RE
        .captures_iter(data)
        .map(|caps| String::from_utf8_lossy(&caps[2]).into_owned())
        .collect()
}
