//! Exponential backoff for HTTP retries

use std::time::Duration;

/// Exponential backoff between retries of an unreachable request
pub struct ExponentialBackoff {
    /// Current delay
    current: Duration,
    /// Maximum delay
    max: Duration,
    /// Multiplier
    multiplier: f64,
}

impl ExponentialBackoff {
    /// Create a new backoff with custom parameters
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            current: initial,
            max,
            multiplier,
        }
    }

    /// Backoff where retry `n` waits `factor * 2^(n-1)` seconds
    pub fn from_factor(factor_secs: f64, max: Duration) -> Self {
        let initial = Duration::try_from_secs_f64(factor_secs.max(0.0)).unwrap_or(Duration::ZERO);
        Self::new(initial.min(max), max, 2.0)
    }

    /// Get the next delay and advance the backoff
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;

        let next = Duration::try_from_secs_f64(self.current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max);
        self.current = std::cmp::min(next, self.max);

        delay
    }
}
