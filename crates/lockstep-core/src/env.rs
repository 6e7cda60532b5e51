//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples the REQ state machine from system
//! resources (time, randomness). The socket itself never reads a clock or an
//! entropy pool; it asks the environment once for its correlation-id seed,
//! and [`DeadlineTimer`](crate::timer::DeadlineTimer) asks it for `now()` when
//! arming.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence

use std::{
    ops::{Add, Sub},
    time::Duration,
};

/// Abstract environment providing time, randomness, and async sleeping.
///
/// # Implementations
///
/// - Simulation (`lockstep-harness::SimEnv`): Virtual time from tokio/turmoil,
///   ChaCha20 RNG with a fixed seed.
///
/// - Production: Real system clock, OS entropy.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Type representing a point in time.
    ///
    /// Must support:
    /// - `Copy` - Lightweight to pass around
    /// - `Ord` - Can be compared (for deadline logic)
    /// - `Add<Duration>` - Deadlines are computed as `now + interval`
    /// - `Sub<Output = Duration>` - Can compute elapsed time
    type Instant: Copy
        + Ord
        + Send
        + Sync
        + Add<Duration, Output = Self::Instant>
        + Sub<Output = Duration>;

    /// Returns the current time.
    ///
    /// Subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code sleeps. The state machine is told that time passed
    /// through `tick()`, never by awaiting.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u32`.
    ///
    /// Used to seed correlation ids.
    fn random_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        self.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }
}
