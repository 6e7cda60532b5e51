//! Socket capability interface.
//!
//! Every socket kind (REQ, and the raw router it wraps) is driven through
//! the same set of entry points. A socket kind implements this trait by
//! delegating the pipe hooks to the router it owns and overriding the
//! message and option calls with its own protocol.

use crate::{error::ReqError, transport::PipeId};

/// Entry points the owning socket layer calls on a protocol.
pub trait SocketProtocol {
    /// Link type the protocol's router is built on
    type Pipe;

    /// Attach a peer link.
    fn add_pipe(&mut self, pipe: Self::Pipe) -> PipeId;

    /// Detach a peer link.
    fn remove_pipe(&mut self, id: PipeId) -> Option<Self::Pipe>;

    /// A peer link has inbound data.
    fn pipe_readable(&mut self, id: PipeId);

    /// A peer link can take outbound data.
    fn pipe_writable(&mut self, id: PipeId);

    /// Send one message.
    ///
    /// # Errors
    ///
    /// Protocol-specific. The REQ socket never fails a send.
    fn send(&mut self, payload: &[u8]) -> Result<(), ReqError>;

    /// Receive one message into `buf`, returning the full message length.
    ///
    /// A return value larger than `buf.len()` means the message was
    /// truncated.
    ///
    /// # Errors
    ///
    /// Protocol-specific; [`ReqError::TryAgain`] when nothing is ready.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, ReqError>;

    /// Set an option from its encoded value.
    ///
    /// # Errors
    ///
    /// [`ReqError::UnsupportedOption`] for ids this socket does not know,
    /// [`ReqError::InvalidArgument`] for malformed values.
    fn set_option(&mut self, option: i32, value: &[u8]) -> Result<(), ReqError>;

    /// Write an option's encoded value into `buf`, returning the bytes
    /// written.
    ///
    /// # Errors
    ///
    /// [`ReqError::UnsupportedOption`] for unknown ids,
    /// [`ReqError::InvalidArgument`] if `buf` is too small.
    fn get_option(&self, option: i32, buf: &mut [u8]) -> Result<usize, ReqError>;

    /// Release protocol state, then tear down the router.
    fn terminate(&mut self);
}
