//! Error types for the wire codec and the client.
//!
//! Server-side per-connection failures stay as `std::io::Error` inside the
//! event loop and are handled locally as disconnections; these enums cover
//! the codec contract and the client's fatal paths.

use std::path::PathBuf;
use thiserror::Error;

/// Frame codec failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Word exceeds the one-byte length prefix.
    #[error("word of {len} bytes exceeds the {max}-byte frame limit")]
    WordTooLong { len: usize, max: usize },

    /// Stream ended before the declared length was satisfied.
    #[error("stream closed before the declared frame length was read")]
    ShortRead,

    /// Stats blob declared a payload length other than the fixed layout's.
    #[error("stats payload length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client-side fatal errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to open input file '{path}': {source}")]
    FileOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
