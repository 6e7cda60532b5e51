//! Error types for the lockstep wire envelope.
//!
//! Parsing failures are never fatal to a socket: the REQ state machine maps
//! every variant here to a discarded frame. They exist as distinct variants so
//! tests and fuzzers can tell *why* a frame was rejected.

use thiserror::Error;

/// Errors produced while parsing an envelope from network bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is shorter than the 4-byte envelope header
    #[error("envelope too short: expected at least {expected} bytes, got {actual}")]
    EnvelopeTooShort {
        /// Minimum size in bytes
        expected: usize,
        /// Actual size received
        actual: usize,
    },

    /// Header top bit is clear, so the frame does not belong to this protocol
    #[error("missing marker bit in envelope header {header:#010x}")]
    MissingMarker {
        /// Raw big-endian header value as received
        header: u32,
    },
}

/// Convenient Result type alias for envelope operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
