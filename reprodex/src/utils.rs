//! Small shared helpers.

use std::path::Path;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Formats bytes as lowercase hex, for checksum/signature display.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX_DIGITS[usize::from(b >> 4)] as char);
        out.push(HEX_DIGITS[usize::from(b & 0x0f)] as char);
    }
    out
}

/// The directory a staged sibling of `path` should be created in.
///
/// Paths with no parent component (bare file names) stage in the current
/// directory.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
