use rand::Rng;
use std::time::Duration;

use super::RaftConfig;

/// Draws randomized election timeouts so that nodes started together do not
/// keep timing out in lockstep.
#[derive(Debug, Clone, Copy)]
pub struct ElectionTimer {
    min_ms: u64,
    max_ms: u64,
}

impl ElectionTimer {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    pub fn from_config(config: &RaftConfig) -> Self {
        Self::new(config.election_timeout_min, config.election_timeout_max)
    }

    /// A timer that always yields the same timeout.
    pub fn fixed(timeout: Duration) -> Self {
        let ms = timeout.as_millis() as u64;
        Self::new(ms, ms)
    }

    pub fn draw(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let mut rng = rand::rng();
        Duration::from_millis(rng.random_range(self.min_ms..=self.max_ms))
    }
}
