//! Error types for qcd operations.

use thiserror::Error;

/// Errors that can occur during qcd operations.
#[derive(Error, Debug)]
pub enum QcdError {
    /// I/O error during read/write operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record exceeded the maximum line length.
    #[error("record at line {line} exceeds {limit} bytes")]
    OversizedRecord {
        /// 1-based line number of the offending record.
        line: u64,
        /// The configured maximum record length.
        limit: usize,
    },

    /// Mask regex failed to compile.
    #[error("invalid mask regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Verification side-file was not valid JSON.
    #[error("verification data is not valid JSON: {0}")]
    MetaJson(#[from] serde_json::Error),

    /// Sketch blob was not valid base64.
    #[error("sketch blob is not valid base64: {0}")]
    SketchBase64(#[from] base64::DecodeError),

    /// Sketch blob failed to decompress or had an invalid frame.
    #[error("sketch blob decode failed: {0}")]
    SketchDecode(String),

    /// Sketch blob carried an unrecognized variant tag.
    #[error("unknown sketch tag: {0:#04x}")]
    UnknownSketchTag(u8),

    /// Sketch bit array did not match the size implied by its tag.
    #[error("sketch bit array has {got} bytes, expected {want}")]
    SketchSize {
        /// Bytes present in the decoded blob.
        got: usize,
        /// Bytes required by the tagged variant.
        want: usize,
    },

    /// A data source did not verify against its own side-file.
    #[error("source failed self-verification: {unverified}/{total} records unverified")]
    SelfCheckFailed {
        /// Records that failed per-record membership checks.
        unverified: u64,
        /// Total records scanned.
        total: u64,
    },
}

/// Result type for qcd operations.
pub type Result<T> = std::result::Result<T, QcdError>;
