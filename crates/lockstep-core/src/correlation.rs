//! Correlation id generator.
//!
//! Ids start at a random 31-bit value so that a restarted process does not
//! reuse the ids of its previous incarnation, then advance by one per
//! request. After 2^31 requests the sequence wraps to zero and ids repeat;
//! there is no re-randomization.

use lockstep_proto::RequestId;

use crate::env::Environment;

/// Sequence of request ids for one socket.
#[derive(Debug, Clone)]
pub struct RequestIdGenerator {
    current: RequestId,
}

impl RequestIdGenerator {
    /// Seed from the environment's randomness, top bit masked off.
    pub fn from_env(env: &impl Environment) -> Self {
        Self::with_seed(env.random_u32())
    }

    /// Seed with a fixed value, top bit masked off.
    #[must_use]
    pub fn with_seed(seed: u32) -> Self {
        Self { current: RequestId::new(seed) }
    }

    /// Id of the most recent request (the seed before any request).
    #[must_use]
    pub fn current(&self) -> RequestId {
        self.current
    }

    /// Move to the next id and return it.
    pub fn advance(&mut self) -> RequestId {
        self.current = self.current.next();
        self.current
    }
}
