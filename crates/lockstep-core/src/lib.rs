//! Lockstep REQ socket core logic
//!
//! This crate contains the pure state machine for the requesting side of the
//! lockstep request/reply pattern. It is completely decoupled from I/O: the
//! socket talks to a [`transport::Router`] and a [`timer::Timer`], and never
//! touches a clock, a thread, or a file descriptor.
//!
//! # Architecture
//!
//! ```text
//!      ┌────────────────────────────┐
//!      │ ReqSocket                  │
//!      │ - correlation ids          │
//!      │ - pending request          │
//!      │ - resend on timer          │
//!      └────────────────────────────┘
//!         ↓ frames               ↓ arm/disarm
//! ┌────────────────┐  ┌───────────────────┐
//! │ XReq (Router)  │  │ Timer             │
//! │ - load balance │  │ - DeadlineTimer   │
//! │ - fair queue   │  │   (Environment)   │
//! └────────────────┘  └───────────────────┘
//!         ↓
//!   Pipe, Pipe, ...
//! ```
//!
//! # Key Principles
//!
//! - Strict lockstep: one request in flight per socket, a new send abandons
//!   the previous one
//! - At-least-once: unanswered requests are resent unchanged until a reply
//!   with the matching id arrives
//! - Non-blocking: every call returns immediately; "not yet" is
//!   [`error::ReqError::TryAgain`]
//!
//! # Modules
//!
//! - [`req`]: REQ socket state machine
//! - [`correlation`]: 31-bit request id sequence
//! - [`xreq`]: Load-balancing / fair-queuing router
//! - [`transport`]: Pipe and router traits
//! - [`timer`]: Resend timer trait and deadline implementation
//! - [`socket`]: Socket capability interface
//! - [`options`]: Socket options and configuration
//! - [`env`]: Environment abstraction (time, RNG)
//! - [`error`]: REQ socket error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod correlation;
pub mod env;
pub mod error;
pub mod options;
pub mod req;
pub mod socket;
pub mod timer;
pub mod transport;
pub mod xreq;

pub use error::ReqError;
pub use options::{ReqConfig, SocketOption};
pub use req::{ReqSocket, ReqStats};
pub use socket::SocketProtocol;
pub use timer::{DeadlineTimer, Timer};
pub use transport::{Pipe, PipeId, RecvOutcome, Router, SendOutcome, TransportError};
pub use xreq::XReq;
