//! Error types for container operations.

use thiserror::Error;

/// Errors that can occur while scanning, framing or splicing containers.
#[derive(Error, Debug)]
pub enum SqueezeError {
    /// Source is neither a byte buffer, a readable stream, nor an existing path
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Header prefix matches no registered container format
    #[error("Image format not recognized")]
    FormatNotRecognized,

    /// JPEG segment number outside 0-15
    #[error("Segment number must be between 0 and 15, got {0}")]
    InvalidSegmentNumber(u8),

    /// JPEG segment number that conventionally carries standard metadata
    #[error("Segment {0} is not a free segment, writing it may overwrite important application data")]
    ReservedSegment(u8),

    /// PNG chunk type with the wrong shape or a reserved name
    #[error("Invalid chunk type {0:?}: {1}")]
    InvalidChunkType(String, String),

    /// Payload exceeds what the container can carry
    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Stored unit does not start with the expected identifier header
    #[error("Could not find identifier {0:?}")]
    IdentifierMismatch(String),

    /// Identifier cannot be framed
    #[error("Invalid identifier {0:?}: {1}")]
    InvalidIdentifier(String, String),

    /// Requested PNG chunk is absent
    #[error("No chunk of type {0:?} found")]
    NotFound(String),

    /// Container ended before a unit was complete
    #[error("Truncated {what} at offset {offset}")]
    Truncated { what: &'static str, offset: usize },

    /// Stored JPEG fragment ends before its (total, index) header
    #[error("Truncated fragment header in fragment {fragment} of APP{segment}")]
    TruncatedFragment { segment: u8, fragment: usize },

    /// Multi-fragment payload is missing fragments (strict mode)
    #[error("Incomplete fragments: expected {expected}, found {found}")]
    IncompleteFragments { expected: usize, found: usize },

    /// PNG chunk CRC does not match its contents
    #[error("CRC mismatch in {chunk_type} chunk at offset {offset}")]
    CrcMismatch { chunk_type: String, offset: usize },

    /// Slot kind does not fit the detected format
    #[error("Slot {slot} cannot address a {format} image")]
    SlotMismatch { slot: String, format: String },

    /// Options could not be parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, SqueezeError>;

impl From<std::io::Error> for SqueezeError {
    fn from(err: std::io::Error) -> Self {
        SqueezeError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for SqueezeError {
    fn from(err: serde_json::Error) -> Self {
        SqueezeError::ConfigError(err.to_string())
    }
}
