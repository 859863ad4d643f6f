//! Reproducible APK repackaging
//!
//! Entries are planned before anything is written: every entry's method is
//! checked and every deflate entry's level is discovered first, so an
//! archive the tool cannot reproduce aborts with no output at all. The
//! output is then materialized next to the destination and persisted over
//! it in one move.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use indexmap::IndexMap;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::utils::parent_dir;

use super::level::deflate_level_for;

/// Write plan for one input entry.
#[derive(Debug, Clone)]
struct EntryPlan {
    index: usize,
    name: String,
    method: CompressionMethod,
    level: Option<u32>,
    last_modified: Option<zip::DateTime>,
    unix_mode: Option<u32>,
}

/// Rebuilds the archive at `input` into `output`, substituting the bytes of
/// every entry named in `rewrites` and streaming all other entries through
/// with their original compressed bytes.
///
/// Rewritten entries keep their method, discovered deflate level, timestamp
/// and permissions, so a rewrite at the same content is bit-identical to
/// the input archive.
pub fn repack(input: &Path, output: &Path, rewrites: &IndexMap<String, Vec<u8>>) -> Result<()> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(input)?))?;
    let mut raw = File::open(input)?;
    let plans = plan_entries(&mut archive, &mut raw)?;

    let tmp = tempfile::NamedTempFile::new_in(parent_dir(output))?;
    {
        let mut writer = ZipWriter::new(BufWriter::new(tmp.as_file()));
        for plan in &plans {
            if let Some(data) = rewrites.get(plan.name.as_str()) {
                tracing::info!("writing '{}'", plan.name);
                let mut options = SimpleFileOptions::default()
                    .compression_method(plan.method)
                    .compression_level(plan.level.map(i64::from));
                if let Some(time) = plan.last_modified {
                    options = options.last_modified_time(time);
                }
                if let Some(mode) = plan.unix_mode {
                    options = options.unix_permissions(mode);
                }
                writer.start_file(plan.name.as_str(), options)?;
                writer.write_all(data)?;
            } else {
                writer.raw_copy_file(archive.by_index_raw(plan.index)?)?;
            }
        }
        let mut inner = writer.finish()?;
        inner.flush()?;
    }
    tmp.persist(output)?;
    Ok(())
}

/// Validates every entry's compression method and discovers deflate levels.
fn plan_entries<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    raw: &mut File,
) -> Result<Vec<EntryPlan>> {
    let mut plans = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        let name = entry.name().to_string();
        let method = entry.compression();
        let last_modified = entry.last_modified();
        let unix_mode = entry.unix_mode();
        let data_start = entry.data_start();
        let compressed_size = entry.compressed_size();
        let uncompressed_size = entry.size();
        drop(entry);

        let level = match method {
            CompressionMethod::Stored => None,
            CompressionMethod::Deflated => {
                let expected = raw_stream_crc(raw, data_start, compressed_size)?;
                let mut content = Vec::with_capacity(uncompressed_size as usize);
                archive.by_index(index)?.read_to_end(&mut content)?;
                let level = deflate_level_for(&content, expected)?.ok_or_else(|| {
                    Error::CompressionLevelNotFound { name: name.clone() }
                })?;
                tracing::debug!("'{name}': deflate level {level}");
                Some(level)
            }
            other => {
                return Err(Error::UnsupportedCompression {
                    name,
                    method: format!("{other:?}"),
                });
            }
        };

        plans.push(EntryPlan {
            index,
            name,
            method,
            level,
            last_modified,
            unix_mode,
        });
    }
    Ok(plans)
}

/// CRC-32 of an entry's raw compressed bytes, read straight from the file.
fn raw_stream_crc(raw: &mut File, data_start: u64, compressed_size: u64) -> Result<u32> {
    raw.seek(SeekFrom::Start(data_start))?;
    let mut hasher = crc32fast::Hasher::new();
    let mut remaining = compressed_size;
    let mut buf = [0u8; 8192];
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = raw.read(&mut buf[..want])?;
        if n == 0 {
            return Err(Error::UnexpectedEof);
        }
        hasher.update(&buf[..n]);
        remaining -= n as u64;
    }
    Ok(hasher.finalize())
}
