use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use reprodex::fix::PROFILE_ENTRY;
use reprodex::prelude::*;
use tempfile::tempdir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MARKER_PREFIX: &[u8] = br#"~~R8{"backend":"dex","compilation-mode":"release","pg-map-id":""#;
const MARKER_SUFFIX: &[u8] = br#"","version":"8.3.37"}"#;

fn dex_with_marker(map_id: &str, seed: u8) -> Vec<u8> {
    let mut body = Vec::new();
    for i in 0..600u32 {
        body.extend_from_slice(format!("method_{}_{seed} ", i % 53).as_bytes());
    }
    body.extend_from_slice(MARKER_PREFIX);
    body.extend_from_slice(map_id.as_bytes());
    body.extend_from_slice(MARKER_SUFFIX);
    body.extend_from_slice(b" trailing string data");
    dex_from_body(&body)
}

fn dex_without_marker(seed: u8) -> Vec<u8> {
    let mut body = Vec::new();
    for i in 0..400u32 {
        body.extend_from_slice(format!("plain_{}_{seed} ", i % 31).as_bytes());
    }
    dex_from_body(&body)
}

fn dex_from_body(body: &[u8]) -> Vec<u8> {
    use adler::Adler32;
    use sha1::{Digest, Sha1};

    let signature: [u8; 20] = Sha1::digest(body).into();
    let mut adler = Adler32::new();
    adler.write_slice(&signature);
    adler.write_slice(body);
    let mut data = Vec::new();
    data.extend_from_slice(b"dex\n035\0");
    data.extend_from_slice(&adler.checksum().to_le_bytes());
    data.extend_from_slice(&signature);
    data.extend_from_slice(body);
    data
}

fn profile_for(dex_bytes: &[(&str, &[u8])]) -> Vec<u8> {
    let records = dex_bytes
        .iter()
        .map(|(name, bytes)| DexRecord {
            profile_key: (*name).to_string(),
            num_type_ids: 7,
            hot_method_region_size: 4,
            dex_checksum: crc32fast::hash(bytes),
            num_method_ids: 11,
        })
        .collect();
    let profile = BaselineProfile {
        records,
        trailing: vec![0x55; 16],
    };
    profile.to_bytes().unwrap()
}

struct FixtureEntry {
    name: &'static str,
    data: Vec<u8>,
    method: CompressionMethod,
    level: Option<i64>,
}

fn write_apk(path: &Path, entries: &[FixtureEntry]) {
    let timestamp = zip::DateTime::from_date_and_time(2023, 4, 5, 6, 7, 8).unwrap();
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for entry in entries {
        let options = SimpleFileOptions::default()
            .compression_method(entry.method)
            .compression_level(entry.level)
            .last_modified_time(timestamp)
            .unix_permissions(0o644);
        writer.start_file(entry.name, options).unwrap();
        writer.write_all(&entry.data).unwrap();
    }
    writer.finish().unwrap();
}

fn read_entry(path: &Path, name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut data = Vec::new();
    archive.by_name(name).unwrap().read_to_end(&mut data).unwrap();
    data
}

/// Raw compressed bytes of an entry, straight from the container file.
fn raw_entry_bytes(path: &Path, name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut span = None;
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i).unwrap();
        if entry.name() == name {
            span = Some((entry.data_start(), entry.compressed_size()));
            break;
        }
    }
    let (start, len) = span.unwrap();
    drop(archive);

    let mut file = File::open(path).unwrap();
    file.seek(SeekFrom::Start(start)).unwrap();
    let mut data = vec![0u8; usize::try_from(len).unwrap()];
    file.read_exact(&mut data).unwrap();
    data
}

fn entry_names(path: &Path) -> Vec<String> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index_raw(i).unwrap().name().to_string())
        .collect()
}

fn assert_dex_digests_consistent(data: &[u8]) {
    let dex = DexFile::parse(data).unwrap();
    assert_eq!(dex.signature, dex.computed_signature());
    assert_eq!(dex.checksum, dex.computed_checksum());
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn test_two_entry_apk_scenario() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("app.apk");
    let output = dir.path().join("app-fixed.apk");

    let dex = dex_with_marker("abc1234", 1);
    write_apk(
        &input,
        &[
            FixtureEntry {
                name: "classes.dex",
                data: dex.clone(),
                method: CompressionMethod::Deflated,
                level: Some(6),
            },
            FixtureEntry {
                name: "assets/notes.txt",
                data: b"unrelated stored payload".to_vec(),
                method: CompressionMethod::Stored,
                level: None,
            },
        ],
    );

    let map_id: MapId = "def5678".parse().unwrap();
    let summary = fix_map_id(&input, &output, &map_id).unwrap();
    assert_eq!(summary.rewritten, vec!["classes.dex".to_string()]);
    assert!(summary.unchanged.is_empty());

    // Entry order survives the repack.
    assert_eq!(
        entry_names(&output),
        vec!["classes.dex".to_string(), "assets/notes.txt".to_string()]
    );

    // The unrelated entry is byte-identical down to its raw stream.
    assert_eq!(
        raw_entry_bytes(&input, "assets/notes.txt"),
        raw_entry_bytes(&output, "assets/notes.txt")
    );
    assert_eq!(
        read_entry(&output, "assets/notes.txt"),
        b"unrelated stored payload"
    );

    // The dex carries the new id under consistent digests.
    let fixed = read_entry(&output, "classes.dex");
    assert!(contains(&fixed, b"\"pg-map-id\":\"def5678\""));
    assert!(!contains(&fixed, b"\"pg-map-id\":\"abc1234\""));
    assert_eq!(fixed.len(), dex.len());
    assert_dex_digests_consistent(&fixed);
}

#[test]
fn test_apk_fix_is_reproducible() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("app.apk");
    let once = dir.path().join("once.apk");
    let again = dir.path().join("again.apk");
    let twice = dir.path().join("twice.apk");

    let dex = dex_with_marker("abc1234", 2);
    let dex2 = dex_without_marker(3);
    let prof = profile_for(&[("classes.dex", &dex), ("classes2.dex", &dex2)]);
    write_apk(
        &input,
        &[
            FixtureEntry {
                name: "classes.dex",
                data: dex,
                method: CompressionMethod::Deflated,
                level: Some(6),
            },
            FixtureEntry {
                name: "classes2.dex",
                data: dex2,
                method: CompressionMethod::Deflated,
                level: Some(1),
            },
            FixtureEntry {
                name: PROFILE_ENTRY,
                data: prof,
                method: CompressionMethod::Stored,
                level: None,
            },
            FixtureEntry {
                name: "META-INF/MANIFEST.MF",
                data: b"Manifest-Version: 1.0\nBuilt-By: someone\n".repeat(20),
                method: CompressionMethod::Deflated,
                level: Some(9),
            },
        ],
    );

    let map_id: MapId = "def5678".parse().unwrap();
    fix_map_id(&input, &once, &map_id).unwrap();
    fix_map_id(&input, &again, &map_id).unwrap();
    let summary = fix_map_id(&once, &twice, &map_id).unwrap();

    // Same input, same id: bit-identical output, run after run.
    assert_eq!(fs::read(&once).unwrap(), fs::read(&again).unwrap());
    // Fixing an already-fixed container converges byte-for-byte.
    assert_eq!(fs::read(&once).unwrap(), fs::read(&twice).unwrap());
    assert!(summary.rewritten.is_empty());
}

#[test]
fn test_apk_profile_records_follow_dex() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("app.apk");
    let output = dir.path().join("out.apk");

    let dex = dex_with_marker("abc1234", 4);
    let dex2 = dex_without_marker(5);
    let prof = profile_for(&[("classes.dex", &dex), ("classes2.dex", &dex2)]);
    write_apk(
        &input,
        &[
            FixtureEntry {
                name: "classes.dex",
                data: dex,
                method: CompressionMethod::Deflated,
                level: Some(6),
            },
            FixtureEntry {
                name: "classes2.dex",
                data: dex2.clone(),
                method: CompressionMethod::Deflated,
                level: Some(6),
            },
            FixtureEntry {
                name: PROFILE_ENTRY,
                data: prof,
                method: CompressionMethod::Stored,
                level: None,
            },
        ],
    );

    let map_id: MapId = "def5678".parse().unwrap();
    let summary = fix_map_id(&input, &output, &map_id).unwrap();

    // Marker-free dex passes through unchanged.
    assert_eq!(read_entry(&output, "classes2.dex"), dex2);
    assert!(summary.unchanged.contains(&"classes2.dex".to_string()));
    assert!(summary.rewritten.contains(&"classes.dex".to_string()));

    // Each profile record now matches the CRC of the final dex bytes.
    let profile = BaselineProfile::parse(&read_entry(&output, PROFILE_ENTRY)).unwrap();
    let fixed_dex = read_entry(&output, "classes.dex");
    assert_eq!(profile.records.len(), 2);
    assert_eq!(profile.records[0].profile_key, "classes.dex");
    assert_eq!(profile.records[0].dex_checksum, crc32fast::hash(&fixed_dex));
    assert_eq!(profile.records[1].profile_key, "classes2.dex");
    assert_eq!(profile.records[1].dex_checksum, crc32fast::hash(&dex2));
}

#[test]
fn test_apk_without_targets_repacks_verbatim() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.zip");
    let output = dir.path().join("plain-out.zip");

    write_apk(
        &input,
        &[
            FixtureEntry {
                name: "readme.txt",
                data: b"nothing to fix here".repeat(40),
                method: CompressionMethod::Deflated,
                level: Some(6),
            },
            FixtureEntry {
                name: "data.bin",
                data: vec![0xa7; 256],
                method: CompressionMethod::Stored,
                level: None,
            },
        ],
    );

    let map_id: MapId = "def5678".parse().unwrap();
    let summary = fix_map_id(&input, &output, &map_id).unwrap();
    assert_eq!(summary.total(), 0);
    assert_eq!(raw_entry_bytes(&input, "readme.txt"), raw_entry_bytes(&output, "readme.txt"));
    assert_eq!(raw_entry_bytes(&input, "data.bin"), raw_entry_bytes(&output, "data.bin"));
}

/// A single-entry archive whose entry claims compression method 99.
fn unsupported_method_zip() -> Vec<u8> {
    let name = b"weird.bin";
    let data = b"opaque payload";
    let crc = crc32fast::hash(data);
    let mut out = Vec::new();
    // local file header
    out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
    out.extend_from_slice(&20u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&99u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0x21u16.to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(name);
    out.extend_from_slice(data);
    let cd_offset = u32::try_from(out.len()).unwrap();
    // central directory entry
    out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    out.extend_from_slice(&20u16.to_le_bytes());
    out.extend_from_slice(&20u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&99u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0x21u16.to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(name);
    let cd_size = u32::try_from(out.len()).unwrap() - cd_offset;
    // end of central directory
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

#[test]
fn test_unsupported_method_aborts_without_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("odd.zip");
    let output = dir.path().join("odd-out.zip");
    fs::write(&input, unsupported_method_zip()).unwrap();

    let map_id: MapId = "def5678".parse().unwrap();
    let err = fix_map_id(&input, &output, &map_id).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedCompression { ref name, .. } if name == "weird.bin"
    ));
    assert!(!output.exists());
}

#[test]
fn test_directory_mode() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir_all(input.join("assets/dexopt")).unwrap();

    let dex = dex_with_marker("abc1234", 6);
    let dex2 = dex_without_marker(7);
    fs::write(input.join("classes.dex"), &dex).unwrap();
    fs::write(input.join("classes2.dex"), &dex2).unwrap();
    fs::write(
        input.join("assets/dexopt/baseline.prof"),
        profile_for(&[("classes.dex", &dex), ("classes2.dex", &dex2)]),
    )
    .unwrap();
    // Neither of these is a rewrite target.
    fs::write(input.join("resources.arsc"), b"resource table").unwrap();
    fs::create_dir_all(input.join("lib")).unwrap();
    fs::write(input.join("lib/classes.dex"), b"not at the root").unwrap();

    let map_id: MapId = "def5678".parse().unwrap();
    let summary = fix_map_id(&input, &output, &map_id).unwrap();
    assert_eq!(summary.total(), 3);

    let fixed = fs::read(output.join("classes.dex")).unwrap();
    assert!(contains(&fixed, b"\"pg-map-id\":\"def5678\""));
    assert_dex_digests_consistent(&fixed);
    assert_eq!(fs::read(output.join("classes2.dex")).unwrap(), dex2);

    let profile =
        BaselineProfile::parse(&fs::read(output.join("assets/dexopt/baseline.prof")).unwrap())
            .unwrap();
    assert_eq!(profile.records[0].dex_checksum, crc32fast::hash(&fixed));
    assert_eq!(profile.records[1].dex_checksum, crc32fast::hash(&dex2));

    // Only the fixed files appear in the output tree.
    assert!(!output.join("resources.arsc").exists());
    assert!(!output.join("lib").exists());
}

#[test]
fn test_directory_mode_without_profile() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("classes.dex"), dex_with_marker("abc1234", 8)).unwrap();

    let map_id: MapId = "def5678".parse().unwrap();
    let summary = fix_map_id(&input, &output, &map_id).unwrap();
    assert_eq!(summary.rewritten, vec!["classes.dex".to_string()]);
    assert!(!output.join("assets").exists());
}

#[test]
fn test_directory_mode_replaces_existing_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir_all(&input).unwrap();
    fs::create_dir_all(&output).unwrap();
    fs::write(input.join("classes.dex"), dex_with_marker("abc1234", 9)).unwrap();
    fs::write(output.join("stale.txt"), b"left over from a previous run").unwrap();

    let map_id: MapId = "def5678".parse().unwrap();
    fix_map_id(&input, &output, &map_id).unwrap();
    assert!(output.join("classes.dex").exists());
    assert!(!output.join("stale.txt").exists());
}

#[test]
fn test_apk_output_replaces_existing_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("app.apk");
    let output = dir.path().join("out.apk");
    write_apk(
        &input,
        &[FixtureEntry {
            name: "classes.dex",
            data: dex_with_marker("abc1234", 10),
            method: CompressionMethod::Deflated,
            level: Some(6),
        }],
    );
    fs::write(&output, b"garbage from an interrupted run").unwrap();

    let map_id: MapId = "def5678".parse().unwrap();
    fix_map_id(&input, &output, &map_id).unwrap();
    let fixed = read_entry(&output, "classes.dex");
    assert!(contains(&fixed, b"\"pg-map-id\":\"def5678\""));
}

#[test]
fn test_in_place_fix_matches_two_step_fix() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("app.apk");
    let reference = dir.path().join("ref.apk");
    write_apk(
        &input,
        &[
            FixtureEntry {
                name: "classes.dex",
                data: dex_with_marker("abc1234", 11),
                method: CompressionMethod::Deflated,
                level: Some(6),
            },
            FixtureEntry {
                name: "assets/notes.txt",
                data: b"stored and untouched".to_vec(),
                method: CompressionMethod::Stored,
                level: None,
            },
        ],
    );

    let map_id: MapId = "def5678".parse().unwrap();
    fix_map_id(&input, &reference, &map_id).unwrap();

    let summary =
        fix_in_place("fix-pg-map-id", &input, &["def5678".to_string()]).unwrap();
    assert_eq!(summary.rewritten, vec!["classes.dex".to_string()]);
    assert_eq!(fs::read(&input).unwrap(), fs::read(&reference).unwrap());
}

#[test]
fn test_in_place_dispatch_errors() {
    let missing = Path::new("definitely-missing.apk");
    assert!(matches!(
        fix_in_place("no-such-fixer", missing, &[]).unwrap_err(),
        Error::UnknownFixCommand { .. }
    ));
    assert!(matches!(
        fix_in_place("fix-pg-map-id", missing, &[]).unwrap_err(),
        Error::InvalidFixArgs { .. }
    ));
}
