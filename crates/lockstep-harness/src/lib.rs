//! Deterministic simulation harness for the lockstep REQ socket.
//!
//! This crate provides a turmoil-compatible `Environment`, an in-memory
//! lossy link with an echoing replier, a hand-fired timer, and an async
//! driver, enabling reproducible tests of retransmission and reply
//! correlation under loss and backpressure.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod manual_timer;
mod sim_env;
mod sim_transport;

pub use driver::{DEFAULT_POLL_INTERVAL, SimClient, SimSocket};
pub use manual_timer::ManualTimer;
pub use sim_env::SimEnv;
pub use sim_transport::{LinkStats, SimConfig, SimPipe, SimReplier, sim_link};
