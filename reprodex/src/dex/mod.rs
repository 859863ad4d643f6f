//! DEX payload handling
//!
//! A DEX payload opens with an 8-byte magic (`dex\n` + three ASCII version
//! digits + NUL), a stored Adler-32 checksum, and a stored SHA-1 signature.
//! The checksum covers everything after itself (signature and body); the
//! signature covers the body only. Rewriting anything in the body therefore
//! invalidates both stored digests, and [`fix_map_id`] recomputes them.

pub mod fixer;
pub mod reader;

pub use fixer::{DexFix, MapId, find_map_ids, fix_map_id};
pub use reader::DexFile;

/// First four bytes of every DEX payload.
pub const DEX_MAGIC: &[u8; 4] = b"dex\n";

/// Offset of the stored Adler-32 checksum.
pub const CHECKSUM_OFFSET: usize = 0x08;

/// Offset of the stored SHA-1 signature.
pub const SIGNATURE_OFFSET: usize = 0x0C;

/// End of the signature field; the body starts here.
pub const SIGNATURE_END: usize = 0x20;
