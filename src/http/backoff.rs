//! Wait times between attempts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

/// Growth unit of the default backoff: attempt `n` waits `n² × 500ms`.
pub const BACKOFF_UNIT: Duration = Duration::from_millis(500);

/// Upper bound (exclusive) of the random jitter added to every wait.
pub const MAX_JITTER_MS: u64 = 1000;

/// Maps the index of a failed attempt (starting at 1) to a wait duration.
pub trait Backoff: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn delay(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

/// Never waits. Useful in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackoff;

impl Backoff for NoBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

/// Quadratic backoff with uniform jitter in `[0, 1000)` milliseconds.
///
/// The random source is seeded once when the policy is created and shared by
/// every call, so concurrent clients drift apart instead of retrying in lockstep.
#[derive(Debug)]
pub struct JitteredBackoff {
    rng: Mutex<StdRng>,
    max_delay: Option<Duration>,
}

impl JitteredBackoff {
    /// Creates a policy seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Creates a policy with a fixed seed; the jitter sequence is reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            max_delay: None,
        }
    }

    /// Caps the deterministic part of the delay. Jitter is still added on top.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// The delay without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let base = BACKOFF_UNIT.saturating_mul(attempt.saturating_mul(attempt));
        match self.max_delay {
            Some(max) => base.min(max),
            None => base,
        }
    }

    fn jitter(&self) -> Duration {
        // rng state stays valid even if the lock was poisoned
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Duration::from_millis(rng.gen_range(0..MAX_JITTER_MS))
    }
}

impl Default for JitteredBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl Backoff for JitteredBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay(attempt) + self.jitter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JITTER: Duration = Duration::from_millis(MAX_JITTER_MS);

    #[test]
    fn test_base_delay_is_quadratic() {
        let backoff = JitteredBackoff::seeded(0);
        assert_eq!(backoff.base_delay(0), Duration::ZERO);
        assert_eq!(backoff.base_delay(1), Duration::from_millis(500));
        assert_eq!(backoff.base_delay(2), Duration::from_secs(2));
        assert_eq!(backoff.base_delay(3), Duration::from_millis(4500));
        assert_eq!(backoff.base_delay(5), Duration::from_millis(12500));
    }

    #[test]
    fn test_base_delay_is_monotonic() {
        let backoff = JitteredBackoff::seeded(0);
        let mut previous = Duration::ZERO;
        for attempt in 1..100 {
            let current = backoff.base_delay(attempt);
            assert!(current >= previous, "attempt {}", attempt);
            previous = current;
        }
    }

    #[test]
    fn test_base_delay_saturates() {
        let backoff = JitteredBackoff::seeded(0);
        assert!(backoff.base_delay(u32::MAX) >= backoff.base_delay(1_000_000));
    }

    #[test]
    fn test_delay_stays_within_jitter_bound() {
        let backoff = JitteredBackoff::new();
        for attempt in 1..=6 {
            for _ in 0..200 {
                let delay = backoff.delay(attempt);
                let base = backoff.base_delay(attempt);
                assert!(delay >= base);
                assert!(delay < base + JITTER);
            }
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = JitteredBackoff::seeded(42);
        let b = JitteredBackoff::seeded(42);
        let first: Vec<_> = (1..=6).map(|i| a.delay(i)).collect();
        let second: Vec<_> = (1..=6).map(|i| b.delay(i)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_max_delay_caps_base_only() {
        let backoff = JitteredBackoff::seeded(7).with_max_delay(Duration::from_secs(3));
        assert_eq!(backoff.base_delay(2), Duration::from_secs(2));
        assert_eq!(backoff.base_delay(10), Duration::from_secs(3));

        let delay = backoff.delay(10);
        assert!(delay >= Duration::from_secs(3));
        assert!(delay < Duration::from_secs(3) + JITTER);
    }

    #[test]
    fn test_no_backoff() {
        assert_eq!(NoBackoff.delay(1), Duration::ZERO);
        assert_eq!(NoBackoff.delay(100), Duration::ZERO);
    }

    #[test]
    fn test_closure_backoff() {
        let linear = |attempt: u32| Duration::from_millis(10 * attempt as u64);
        assert_eq!(linear.delay(3), Duration::from_millis(30));
    }
}
