//! Socket options and configuration.
//!
//! Options travel as raw bytes, the way socket-style option calls do: the
//! caller names an option by id and passes a buffer. The REQ socket knows a
//! single option, [`SocketOption::ResendInterval`], encoded as a native-endian
//! `i32` count of milliseconds.

use std::time::Duration;

/// Options understood by the REQ socket.
///
/// `#[repr(i32)]` keeps the ids stable for callers passing raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SocketOption {
    /// Milliseconds to wait for a reply before resending the request
    ResendInterval = 1,
}

impl SocketOption {
    /// Look up an option by its raw id.
    #[must_use]
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(Self::ResendInterval),
            _ => None,
        }
    }

    /// Raw id of this option
    #[must_use]
    pub fn to_raw(self) -> i32 {
        self as i32
    }
}

/// Encoded size of an integer option value
pub const INT_OPTION_SIZE: usize = std::mem::size_of::<i32>();

/// Default resend interval (60 seconds)
pub const DEFAULT_RESEND_INTERVAL: Duration = Duration::from_secs(60);

/// REQ socket configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqConfig {
    /// Time to wait for a reply before retransmitting.
    ///
    /// Values outside `1..=i32::MAX` milliseconds are clamped into that range
    /// when the socket is built.
    pub resend_interval: Duration,
}

impl Default for ReqConfig {
    fn default() -> Self {
        Self { resend_interval: DEFAULT_RESEND_INTERVAL }
    }
}

impl ReqConfig {
    /// Resend interval as a positive millisecond count
    #[must_use]
    pub fn resend_interval_millis(&self) -> i32 {
        i32::try_from(self.resend_interval.as_millis()).unwrap_or(i32::MAX).max(1)
    }
}
