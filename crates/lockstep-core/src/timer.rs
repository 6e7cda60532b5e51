//! Resend timer abstraction.
//!
//! The REQ socket consumes a single-shot timer: `arm` starts one countdown,
//! `disarm` cancels it, and an expiry must be explicitly re-armed to repeat.
//! The host runtime decides how expiry is observed; the socket only asks
//! [`Timer::take_expired`] from [`tick`](crate::req::ReqSocket::tick).

use std::time::Duration;

use crate::env::Environment;

/// Single-shot countdown owned by one socket.
pub trait Timer {
    /// Start a countdown of `interval`, replacing any running one.
    fn arm(&mut self, interval: Duration);

    /// Cancel the running countdown, if any.
    fn disarm(&mut self);

    /// True while a countdown is running and has not been consumed.
    fn is_armed(&self) -> bool;

    /// Consume an elapsed countdown.
    ///
    /// Returns true exactly once per expiry; the timer is disarmed afterwards.
    fn take_expired(&mut self) -> bool;
}

/// Deadline-based timer reading time from an [`Environment`].
///
/// Arming records `env.now() + interval`. The driver sleeps until
/// [`DeadlineTimer::deadline`] and then ticks the socket.
#[derive(Clone)]
pub struct DeadlineTimer<E: Environment> {
    env: E,
    deadline: Option<E::Instant>,
}

impl<E: Environment> DeadlineTimer<E> {
    /// Create a disarmed timer
    pub fn new(env: E) -> Self {
        Self { env, deadline: None }
    }

    /// Point in time the running countdown expires at
    #[must_use]
    pub fn deadline(&self) -> Option<E::Instant> {
        self.deadline
    }

    /// Time left until expiry, zero once elapsed
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let deadline = self.deadline?;
        let now = self.env.now();
        Some(if deadline > now { deadline - now } else { Duration::ZERO })
    }
}

impl<E: Environment> Timer for DeadlineTimer<E> {
    fn arm(&mut self, interval: Duration) {
        self.deadline = Some(self.env.now() + interval);
    }

    fn disarm(&mut self) {
        self.deadline = None;
    }

    fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    fn take_expired(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if self.env.now() >= deadline => {
                self.deadline = None;
                true
            },
            _ => false,
        }
    }
}

impl<E: Environment> std::fmt::Debug for DeadlineTimer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineTimer").field("armed", &self.is_armed()).finish_non_exhaustive()
    }
}
