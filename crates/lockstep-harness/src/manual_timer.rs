//! Hand-fired timer for step-by-step tests.

use std::time::Duration;

use lockstep_core::timer::Timer;

/// Timer that expires only when [`ManualTimer::fire`] is called.
///
/// Every arming is recorded, which lets tests check which interval each
/// countdown used.
#[derive(Debug, Default, Clone)]
pub struct ManualTimer {
    armed: Option<Duration>,
    expired: bool,
    history: Vec<Duration>,
}

impl ManualTimer {
    /// Create a disarmed timer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the running countdown elapse. No effect while disarmed.
    pub fn fire(&mut self) {
        self.expired = self.armed.is_some();
    }

    /// Interval of the running countdown
    #[must_use]
    pub fn armed_interval(&self) -> Option<Duration> {
        self.armed
    }

    /// Every interval this timer was armed with, oldest first
    #[must_use]
    pub fn history(&self) -> &[Duration] {
        &self.history
    }
}

impl Timer for ManualTimer {
    fn arm(&mut self, interval: Duration) {
        self.armed = Some(interval);
        self.expired = false;
        self.history.push(interval);
    }

    fn disarm(&mut self) {
        self.armed = None;
        self.expired = false;
    }

    fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    fn take_expired(&mut self) -> bool {
        if !self.expired {
            return false;
        }
        self.expired = false;
        self.armed = None;
        true
    }
}
