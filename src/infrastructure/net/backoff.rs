//! Bounded retry with exponential backoff.
//!
//! One policy is shared by everything that talks to an unreliable network:
//! the image download workers and the link expander.

use std::time::Duration;

/// Default number of attempts before a request is dropped.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Default upper bound on any single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Bounded exponential backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles per retry.
    pub initial_delay: Duration,
    /// Cap applied to every delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default delay cap.
    #[must_use]
    pub const fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Returns the backoff delays, one per attempt.
    ///
    /// The k-th delay is `initial_delay * 2^k`, capped at `max_delay`.
    /// Callers sleep the k-th delay after the k-th failed attempt.
    pub fn delays(self) -> impl Iterator<Item = Duration> {
        (0..self.max_attempts).map(move |attempt| {
            self.initial_delay
                .saturating_mul(2_u32.saturating_pow(attempt.min(16)))
                .min(self.max_delay)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_per_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(2000),
            ]
        );
    }

    #[test]
    fn test_delays_are_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(6),
        };
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(delays[0], Duration::from_secs(4));
        assert!(delays[1..].iter().all(|d| *d == Duration::from_secs(6)));
    }

    #[test]
    fn test_one_delay_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delays().count() as u32, policy.max_attempts);
    }

    #[test]
    fn test_huge_attempt_count_does_not_overflow() {
        let policy = RetryPolicy {
            max_attempts: 64,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        };
        assert!(policy.delays().all(|d| d <= Duration::from_secs(30)));
    }
}
