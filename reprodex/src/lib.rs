//! # reprodex
//!
//! A pure-Rust library for making Android release artifacts reproducible.
//!
//! R8 stamps every dex it compiles with the `pg-map-id` of the proguard
//! mapping file, so two otherwise identical release builds differ in a
//! 7-hex identifier and in every checksum derived from it. This crate
//! rewrites the id and repairs the dependent state byte-for-byte:
//!
//! - **DEX** - marker rewrite plus SHA-1 signature and Adler-32 checksum
//! - **Baseline profiles** - per-dex CRC-32 records in the `010 P` format
//! - **APK containers** - repackaging that keeps every other entry
//!   byte-identical, rediscovering deflate levels by trial
//!
//! ## Quick Start
//!
//! ```no_run
//! use reprodex::dex::MapId;
//!
//! let map_id: MapId = "0123abc".parse()?;
//! let summary = reprodex::fix::fix_map_id(
//!     "app-release.apk".as_ref(),
//!     "app-release-fixed.apk".as_ref(),
//!     &map_id,
//! )?;
//! println!("{} files rewritten", summary.rewritten.len());
//! # Ok::<(), reprodex::Error>(())
//! ```
//!
//! ### Using the Prelude
//!
//! ```
//! use reprodex::prelude::*;
//! ```

pub mod apk;
pub mod dex;
pub mod error;
pub mod fix;
pub mod prof;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::apk::{deflate_level_for, repack};
    pub use crate::dex::{DexFile, DexFix, MapId, fix_map_id as fix_dex_map_id};
    pub use crate::error::{Error, Result};
    pub use crate::fix::{FixSummary, fix_in_place, fix_map_id};
    pub use crate::prof::{BaselineProfile, DexRecord, fix_dex_checksums};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
