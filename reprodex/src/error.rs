//! Error types for `reprodex`

use thiserror::Error;

/// The error type for `reprodex` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected end of file.
    #[error("unexpected end of file")]
    UnexpectedEof,

    // ==================== DEX Format Errors ====================
    /// The payload does not start with a valid DEX magic.
    #[error("invalid DEX magic: expected dex\\n<nnn>\\0, found {0:?}")]
    InvalidDexMagic([u8; 8]),

    /// The payload is too short to hold a DEX header.
    #[error("DEX payload truncated: {len} bytes (header is 32 bytes)")]
    DexTruncated {
        /// The payload length.
        len: usize,
    },

    /// The replacement pg-map-id is not 7 lowercase hex digits.
    #[error("invalid pg-map-id {value:?} (expected exactly 7 lowercase hex digits)")]
    InvalidMapId {
        /// The rejected value.
        value: String,
    },

    // ==================== Baseline Profile Errors ====================
    /// The payload is not a valid baseline profile.
    #[error("invalid profile magic: expected pro\\0, found {0:?}")]
    InvalidProfMagic([u8; 4]),

    /// The profile version is recognized but not handled.
    #[error("unsupported profile version: {version:?} (supported: 010 P)")]
    UnsupportedProfVersion {
        /// The version tag found in the file.
        version: [u8; 4],
    },

    /// The payload is too short to hold a profile header.
    #[error("profile header truncated: {len} bytes (header is 17 bytes)")]
    ProfTruncated {
        /// The payload length.
        len: usize,
    },

    /// A profile record's fixed-width fields run past the decompressed data.
    #[error("profile record {index} truncated: need {needed} bytes, {remaining} remaining")]
    ProfRecordTruncated {
        /// Zero-based record index.
        index: usize,
        /// Bytes the fixed-width fields require.
        needed: usize,
        /// Bytes left in the decompressed data.
        remaining: usize,
    },

    /// A profile record's key is not valid UTF-8.
    #[error("profile record {index} has a non-UTF-8 dex key")]
    ProfKeyNotUtf8 {
        /// Zero-based record index.
        index: usize,
    },

    /// A declared profile length disagrees with the actual data.
    #[error("profile {field} length mismatch: header declares {declared} bytes, found {actual}")]
    ProfSizeMismatch {
        /// Which length field disagrees.
        field: &'static str,
        /// The declared length.
        declared: u64,
        /// The actual length.
        actual: u64,
    },

    /// Zlib decompression failed.
    #[error("zlib decompression failed: {message}")]
    ZlibDecompressionFailed {
        /// The error message.
        message: String,
    },

    // ==================== APK Container Errors ====================
    /// ZIP archive error.
    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An entry uses a compression method other than stored or deflated.
    #[error("unsupported compression method {method} for '{name}' (supported: stored, deflated)")]
    UnsupportedCompression {
        /// The entry name.
        name: String,
        /// The compression method found.
        method: String,
    },

    /// No candidate deflate level reproduces an entry's compressed bytes.
    #[error("cannot determine deflate level for '{name}' (tried 9, 6, 4, 1)")]
    CompressionLevelNotFound {
        /// The entry name.
        name: String,
    },

    // ==================== Fix Operation Errors ====================
    /// The in-place fix command name is not registered.
    #[error("unknown fix command '{command}' (known commands: fix-pg-map-id)")]
    UnknownFixCommand {
        /// The requested command.
        command: String,
    },

    /// The in-place fix command was given unusable arguments.
    #[error("invalid arguments for {command}: {message}")]
    InvalidFixArgs {
        /// The command the arguments were meant for.
        command: String,
        /// What was wrong with them.
        message: String,
    },
}

// Persisting a staged temp file reduces to the underlying IO failure.
impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}

/// A specialized Result type for `reprodex` operations.
pub type Result<T> = std::result::Result<T, Error>;
