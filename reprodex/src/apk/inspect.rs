//! Container listings for diagnostics

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use zip::ZipArchive;

use crate::error::Result;

/// Per-entry facts read from the central directory, without decompression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Entry name as stored.
    pub name: String,
    /// Compression method, e.g. `Stored` or `Deflated`.
    pub method: String,
    /// Size of the raw stream inside the container.
    pub compressed_size: u64,
    /// Declared size after decompression.
    pub uncompressed_size: u64,
    /// Declared CRC-32 of the decompressed bytes.
    pub crc32: u32,
}

/// Lists every entry of the archive at `path` in central directory order.
pub fn list_entries(path: &Path) -> Result<Vec<EntryInfo>> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        entries.push(EntryInfo {
            name: entry.name().to_string(),
            method: format!("{:?}", entry.compression()),
            compressed_size: entry.compressed_size(),
            uncompressed_size: entry.size(),
            crc32: entry.crc32(),
        });
    }
    Ok(entries)
}
