//! DEX header reader

use std::io::{Cursor, Read};

use adler::Adler32;
use byteorder::{LittleEndian, ReadBytesExt};
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

use super::{CHECKSUM_OFFSET, DEX_MAGIC, SIGNATURE_END};

/// Typed view of a DEX payload.
///
/// Borrows the body rather than copying it; payloads are only copied when a
/// rewrite actually changes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexFile<'a> {
    /// The three ASCII version digits from the magic, e.g. `035`.
    pub version: [u8; 3],
    /// Stored Adler-32 checksum over signature and body.
    pub checksum: u32,
    /// Stored SHA-1 signature over the body.
    pub signature: [u8; 20],
    /// Everything after the signature field.
    pub body: &'a [u8],
}

impl<'a> DexFile<'a> {
    /// Parses the DEX header and splits off the body.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < SIGNATURE_END {
            return Err(Error::DexTruncated { len: data.len() });
        }
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&data[..8]);
        if &magic[..4] != DEX_MAGIC
            || !magic[4..7].iter().all(u8::is_ascii_digit)
            || magic[7] != 0
        {
            return Err(Error::InvalidDexMagic(magic));
        }
        let mut version = [0u8; 3];
        version.copy_from_slice(&magic[4..7]);

        let mut cursor = Cursor::new(&data[CHECKSUM_OFFSET..SIGNATURE_END]);
        let checksum = cursor.read_u32::<LittleEndian>()?;
        let mut signature = [0u8; 20];
        cursor.read_exact(&mut signature)?;

        Ok(DexFile {
            version,
            checksum,
            signature,
            body: &data[SIGNATURE_END..],
        })
    }

    /// The version digits as text, e.g. `"035"`.
    pub fn version_str(&self) -> &str {
        std::str::from_utf8(&self.version).unwrap_or("???")
    }

    /// SHA-1 over the body, as the signature field should store it.
    pub fn computed_signature(&self) -> [u8; 20] {
        Sha1::digest(self.body).into()
    }

    /// Adler-32 over the stored signature and body, as the checksum field
    /// should store it.
    pub fn computed_checksum(&self) -> u32 {
        let mut adler = Adler32::new();
        adler.write_slice(&self.signature);
        adler.write_slice(self.body);
        adler.checksum()
    }
}
