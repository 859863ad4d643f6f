//! APK/ZIP container handling
//!
//! The ZIP format records each entry's compression method but not the
//! deflate level it was produced at, so bit-identical repackaging has to
//! rediscover the level by trial ([`deflate_level_for`]) before any entry
//! is rewritten. Entries that are not rewritten keep their original
//! compressed bytes verbatim.

pub mod inspect;
pub mod level;
pub mod repack;

pub use inspect::{EntryInfo, list_entries};
pub use level::{CANDIDATE_LEVELS, deflate_level_for};
pub use repack::repack;
