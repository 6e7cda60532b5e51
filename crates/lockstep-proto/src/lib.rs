//! # Lockstep Protocol: Wire Envelope
//!
//! This crate implements the envelope that tags every request and reply of
//! the lockstep request/reply pattern.
//!
//! ## Wire Format
//!
//! ```text
//! ┌───────────────────────────┬──────────────────────────┐
//! │ header: u32, Big Endian   │ payload: opaque bytes    │
//! │ bit 31 = marker (always 1)│ (any length, may be 0)   │
//! │ bits 0-30 = correlation id│                          │
//! └───────────────────────────┴──────────────────────────┘
//! ```
//!
//! ## Implementation Notes
//!
//! - **Zero-Copy Parsing**: [`EnvelopeHeader`] is cast directly from network
//!   bytes with [`zerocopy`](https://docs.rs/zerocopy).
//!
//! - **Single Buffer**: [`Envelope`] keeps header and payload in one
//!   [`bytes::Bytes`], so storing a request for retransmission and handing it
//!   to a transport never copies the payload twice.
//!
//! - **Explicit Validation**: Short frames and frames without the marker bit
//!   are rejected with a [`ProtocolError`]; there is no unchecked parse path.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod header;
pub mod request_id;

pub use envelope::Envelope;
pub use errors::{ProtocolError, Result};
pub use header::EnvelopeHeader;
pub use request_id::RequestId;
