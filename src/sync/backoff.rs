//! Reconnect backoff policy.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with a cap and symmetric jitter.
///
/// The delay before reconnect attempt `n` (1-based) is
/// `min(initial * 2^(n-1), max)`, scaled by a random factor in
/// `[1 - jitter, 1 + jitter]` and clamped to `max` again.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// When `false`, a dropped stream is not reopened.
    pub enabled: bool,
    /// Delay before the first reconnect.
    pub initial_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Consecutive failed attempts before giving up. `0` means never.
    pub max_attempts: u32,
    /// Jitter fraction in `[0, 1]`.
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 0,
            jitter: 0.2,
        }
    }
}

impl BackoffPolicy {
    /// A policy that never reconnects.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Returns `true` if attempt `attempt` (1-based) may be made.
    #[must_use]
    pub const fn allows(&self, attempt: u32) -> bool {
        self.enabled && (self.max_attempts == 0 || attempt <= self.max_attempts)
    }

    /// Deterministic delay for `attempt` given a jitter sample in `[-1, 1]`.
    #[must_use]
    pub fn delay_with(&self, attempt: u32, sample: f64) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let base = self
            .initial_delay
            .saturating_mul(1_u32 << exponent)
            .min(self.max_delay);
        let factor = 1.0 + self.jitter.clamp(0.0, 1.0) * sample.clamp(-1.0, 1.0);
        base.mul_f64(factor.max(0.0)).min(self.max_delay)
    }

    /// Delay for `attempt` with a fresh random jitter sample.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let sample = if self.jitter > 0.0 {
            rand::thread_rng().gen_range(-1.0..=1.0)
        } else {
            0.0
        };
        self.delay_with(attempt, sample)
    }
}
