//! Transport abstraction for the request-routing layer.
//!
//! The REQ socket never talks to peers directly. It hands whole envelopes to
//! a [`Router`], which owns any number of [`Pipe`]s (one per peer link) and
//! decides which pipe carries a request and which pipe a reply is read from.
//!
//! # Non-blocking Contract
//!
//! Every call returns immediately:
//!
//! - `send` reports [`SendOutcome::Busy`] when no pipe can take the frame
//! - `recv` reports [`RecvOutcome::NoData`] when no pipe has a frame
//!
//! Anything else is a [`TransportError`]. The router may recover from
//! per-pipe errors internally (for example by dropping a closed pipe); an
//! error that escapes a router is treated as fatal by the socket.

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

/// Handle identifying a pipe inside one router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PipeId(pub(crate) u64);

impl PipeId {
    /// Raw handle value
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipe#{}", self.0)
    }
}

/// Result of a non-blocking send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Frame was handed to a peer link
    Sent,
    /// Backpressure: nothing was sent, try again later
    Busy,
}

/// Result of a non-blocking receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecvOutcome {
    /// One complete frame
    Frame(Bytes),
    /// Nothing queued right now
    NoData,
}

/// Failures other than backpressure or an empty queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The link or router has been shut down
    #[error("transport closed")]
    Closed,

    /// Any other link failure
    #[error("transport failure: {0}")]
    Failed(String),
}

/// One link to a peer, carrying whole frames.
pub trait Pipe {
    /// Queue `frame` for the peer without blocking.
    ///
    /// # Errors
    ///
    /// [`TransportError::Closed`] once the peer has gone away.
    fn send(&mut self, frame: &[u8]) -> Result<SendOutcome, TransportError>;

    /// Take the next frame from the peer without blocking.
    ///
    /// `max_len` is a capacity hint. A pipe may return a longer frame; the
    /// caller decides how to truncate.
    ///
    /// # Errors
    ///
    /// [`TransportError::Closed`] once the peer has gone away.
    fn recv(&mut self, max_len: usize) -> Result<RecvOutcome, TransportError>;
}

/// Request-routing layer: load-balanced send, fair-queued receive.
///
/// The peer hooks mirror the socket lifecycle: pipes are attached and
/// detached as connections come and go, and readiness notifications tell the
/// router a previously busy or drained pipe is worth trying again.
pub trait Router {
    /// Link type this router distributes frames across
    type Pipe: Pipe;

    /// Attach a new pipe. It starts out readable and writable.
    fn add_pipe(&mut self, pipe: Self::Pipe) -> PipeId;

    /// Detach a pipe, handing it back to the caller.
    fn remove_pipe(&mut self, id: PipeId) -> Option<Self::Pipe>;

    /// The pipe has inbound frames again.
    fn pipe_readable(&mut self, id: PipeId);

    /// The pipe can accept outbound frames again.
    fn pipe_writable(&mut self, id: PipeId);

    /// Send one frame to exactly one pipe.
    ///
    /// # Errors
    ///
    /// Only for failures the router cannot absorb.
    fn send(&mut self, frame: &[u8]) -> Result<SendOutcome, TransportError>;

    /// Receive one frame from some pipe.
    ///
    /// # Errors
    ///
    /// Only for failures the router cannot absorb.
    fn recv(&mut self, max_len: usize) -> Result<RecvOutcome, TransportError>;

    /// Drop every pipe. Called once at socket termination.
    fn terminate(&mut self);
}
