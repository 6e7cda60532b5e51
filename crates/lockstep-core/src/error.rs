//! Error types for the REQ socket.
//!
//! Only caller misuse and "nothing to hand out yet" surface as errors.
//! Transport backpressure on send is absorbed, and broken invariants (a
//! transport failing with something other than busy/no-data, a resend firing
//! with nothing in flight) abort instead of returning.

use std::io;

use thiserror::Error;

use crate::options::SocketOption;

/// Errors returned by [`ReqSocket`](crate::req::ReqSocket) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReqError {
    /// Operation is not valid in the current request state
    #[error("invalid state: cannot {operation} with no request in progress")]
    InvalidState {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// No acceptable reply is available yet
    #[error("no reply available, try again")]
    TryAgain,

    /// Option value or buffer has the wrong size or an out-of-range value
    #[error("invalid argument for {option:?}: {reason}")]
    InvalidArgument {
        /// Option being accessed
        option: SocketOption,
        /// What was wrong with the argument
        reason: String,
    },

    /// Option id is not recognised by this socket kind
    #[error("unsupported socket option: {0}")]
    UnsupportedOption(i32),
}

impl ReqError {
    /// Returns true if the call may succeed when retried later.
    ///
    /// Only [`ReqError::TryAgain`] is transient. Everything else is caller
    /// misuse that retrying cannot fix.
    pub fn is_transient(&self) -> bool {
        matches!(self, ReqError::TryAgain)
    }
}

/// Convert ReqError to io::Error for socket-style APIs.
impl From<ReqError> for io::Error {
    fn from(err: ReqError) -> Self {
        let kind = match &err {
            ReqError::TryAgain => io::ErrorKind::WouldBlock,
            ReqError::InvalidArgument { .. } => io::ErrorKind::InvalidInput,
            ReqError::UnsupportedOption(_) => io::ErrorKind::Unsupported,
            ReqError::InvalidState { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err.to_string())
    }
}
