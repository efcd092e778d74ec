//! Backoff policy for transient failures.
//!
//! The client retries transport failures, HTTP 429 and HTTP 500/502/503 (see
//! [`Error::is_retryable`](crate::Error::is_retryable)). This module only decides
//! how long to wait between attempts and when to stop.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with an upper bound and optional jitter.
///
/// The delay after failed attempt `n` (0-indexed) is `base_delay * 2^n`, capped
/// at `max_delay`. With jitter the delay is scaled by a random factor in
/// `[0.5, 1.0)`, which keeps consecutive uncapped delays strictly increasing.
///
/// # Examples
///
/// ```
/// use costops_client::RetryPolicy;
/// use std::time::Duration;
///
/// // 100ms, 200ms, 400ms, then give up
/// let policy = RetryPolicy {
///     max_retries: 3,
///     base_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(10),
///     jitter: false,
/// };
///
/// assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_millis(100)));
/// assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(400)));
/// assert_eq!(policy.delay_for_attempt(3), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` disables retrying.
    pub max_retries: usize,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Whether to randomize delays (recommended, avoids thundering herds).
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total physical attempts this policy allows.
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Returns the delay to wait after failed attempt `attempt` (0-indexed), or
    /// `None` if that attempt was the last one allowed.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }

        let multiplier = u32::try_from(attempt)
            .ok()
            .and_then(|exponent| 2u32.checked_pow(exponent))
            .unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(multiplier).min(self.max_delay);

        if self.jitter {
            let factor = rand::thread_rng().gen_range(0.5..1.0);
            Some(delay.mul_f64(factor))
        } else {
            Some(delay)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter: false,
        };

        assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_millis(800)));
        assert_eq!(policy.delay_for_attempt(4), Some(Duration::from_millis(1600)));
        assert_eq!(policy.delay_for_attempt(5), None);
        assert_eq!(policy.max_attempts(), 6);
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy {
            max_retries: 40,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            jitter: false,
        };

        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_secs(5)));
        assert_eq!(policy.delay_for_attempt(39), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_jittered_delays_strictly_increase() {
        let policy = RetryPolicy {
            max_retries: 6,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(60),
            jitter: true,
        };

        for _ in 0..100 {
            let delays: Vec<_> = (0..6)
                .map(|attempt| policy.delay_for_attempt(attempt).unwrap())
                .collect();
            for (attempt, delay) in delays.iter().enumerate() {
                let full = Duration::from_millis(50) * 2u32.pow(attempt as u32);
                assert!(*delay >= full / 2 && *delay <= full);
            }
            assert!(delays.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_huge_attempt_stays_capped() {
        let policy = RetryPolicy {
            max_retries: usize::MAX,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            jitter: false,
        };

        // 2^32 would wrap to 2^0 if the exponent were truncated.
        assert_eq!(policy.delay_for_attempt(1usize << 32), Some(Duration::from_secs(5)));
        assert_eq!(policy.delay_for_attempt(usize::MAX - 1), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_no_retries() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.delay_for_attempt(0), None);
        assert_eq!(policy.max_attempts(), 1);
    }
}
