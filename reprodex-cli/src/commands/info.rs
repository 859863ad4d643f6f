use std::fs;
use std::path::Path;

use reprodex::dex::{self, DEX_MAGIC, DexFile};
use reprodex::fix::is_fix_target;
use reprodex::prof::{BaselineProfile, PROF_MAGIC};
use reprodex::utils::to_hex;

pub fn execute(file: &Path) -> anyhow::Result<()> {
    let data = fs::read(file)?;
    if data.starts_with(DEX_MAGIC) {
        print_dex(file, &data)
    } else if data.starts_with(&PROF_MAGIC) {
        print_prof(file, &data)
    } else if data.starts_with(b"PK") {
        print_apk(file)
    } else {
        anyhow::bail!("unrecognized file format: {}", file.display())
    }
}

fn print_dex(file: &Path, data: &[u8]) -> anyhow::Result<()> {
    let dex = DexFile::parse(data)?;
    let computed_checksum = dex.computed_checksum();
    let computed_signature = dex.computed_signature();

    println!("DEX Information: {}", file.display());
    println!();
    println!("Version: {}", dex.version_str());
    println!("Size: {} ({} bytes)", format_size(data.len() as u64), data.len());
    println!();
    println!("Checksum (stored):    {:#010x}", dex.checksum);
    println!("Checksum (computed):  {computed_checksum:#010x}");
    println!("Signature (stored):   {}", to_hex(&dex.signature));
    println!("Signature (computed): {}", to_hex(&computed_signature));
    if dex.checksum != computed_checksum || dex.signature != computed_signature {
        println!();
        println!("Stored digests do not match the payload");
    }
    println!();

    let ids = dex::find_map_ids(data);
    if ids.is_empty() {
        println!("No pg-map-id markers");
    } else {
        println!("pg-map-id markers:");
        for id in ids {
            println!("  {id}");
        }
    }
    Ok(())
}

fn print_prof(file: &Path, data: &[u8]) -> anyhow::Result<()> {
    let profile = BaselineProfile::parse(data)?;

    println!("Profile Information: {}", file.display());
    println!();
    println!("Version: 010 P");
    println!("Dex files: {}", profile.records.len());
    println!("Uncompressed line table: {} bytes", profile.uncompressed_len());
    println!("Trailing data: {} bytes", profile.trailing.len());
    println!();

    for record in &profile.records {
        println!(
            "  {:<24} crc32 {:08x}  {:>6} types  {:>8} methods  hot region {} bytes",
            record.profile_key,
            record.dex_checksum,
            record.num_type_ids,
            record.num_method_ids,
            record.hot_method_region_size
        );
    }
    Ok(())
}

fn print_apk(file: &Path) -> anyhow::Result<()> {
    let entries = reprodex::apk::list_entries(file)?;

    let total_entries = entries.len();
    let total_compressed: u64 = entries.iter().map(|e| e.compressed_size).sum();
    let total_uncompressed: u64 = entries.iter().map(|e| e.uncompressed_size).sum();

    println!("APK Information: {}", file.display());
    println!();
    println!("Total entries: {total_entries}");
    println!(
        "Total size (compressed): {} ({} bytes)",
        format_size(total_compressed),
        total_compressed
    );
    println!(
        "Total size (uncompressed): {} ({} bytes)",
        format_size(total_uncompressed),
        total_uncompressed
    );
    if total_compressed > 0 {
        let ratio = (total_uncompressed as f64) / (total_compressed as f64);
        println!("Compression ratio: {ratio:.2}x");
    }
    println!();

    println!("Entries (* marks fix targets):");
    for entry in &entries {
        let mark = if is_fix_target(&entry.name) { "*" } else { " " };
        println!(
            "  {mark} {:<44} {:>8}  {:>10} -> {:>10}  crc32 {:08x}",
            entry.name,
            entry.method,
            format_size(entry.compressed_size),
            format_size(entry.uncompressed_size),
            entry.crc32
        );
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
