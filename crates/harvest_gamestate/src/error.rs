//! Save record errors

use thiserror::Error;

/// Save record errors
#[derive(Debug, Error)]
pub enum RecordError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Payload JSON could not be written or read
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Payload failed to decompress
    #[error("Decompression failed: {0}")]
    Compression(String),
    /// Stored uncompressed size is larger than we accept
    #[error("Uncompressed size {size} exceeds limit {limit}")]
    SizeHintExceeded { size: usize, limit: usize },
    /// Record written by a newer format
    #[error("Version mismatch for {tag}: record version {found}, supported {supported}")]
    VersionMismatch { tag: String, found: u32, supported: u32 },
    /// Tag is not one of ours
    #[error("Unknown record tag: {0}")]
    UnknownTag(String),
    /// Ran out of bytes mid-record
    #[error("Truncated record: needed {needed} bytes, {available} left")]
    Truncated { needed: usize, available: usize },
}

/// Result type alias
pub type RecordResult<T> = Result<T, RecordError>;
