//! Reconnection backoff policy

use std::time::Duration;

/// Linear, capped, bounded reconnection schedule.
///
/// Attempt `n` (1-based) waits `min(step * n, cap)`. After `max_attempts`
/// failed attempts the store gives up until reconnected manually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub step: Duration,
    pub cap: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            step: Duration::from_millis(200),
            cap: Duration::from_millis(3000),
        }
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, step: Duration, cap: Duration) -> Self {
        Self {
            max_attempts,
            step,
            cap,
        }
    }

    /// Delay before the given attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt).min(self.cap)
    }

    /// Delays for every attempt the policy allows, in order
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_attempts).map(|attempt| self.delay(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ReconnectPolicy::default();

        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(5), Duration::from_millis(1000));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = ReconnectPolicy::default();

        assert_eq!(policy.delay(15), Duration::from_millis(3000));
        assert_eq!(policy.delay(u32::MAX), Duration::from_millis(3000));
    }

    #[test]
    fn test_schedule_is_bounded() {
        let policy = ReconnectPolicy::new(3, Duration::from_millis(100), Duration::from_millis(250));
        let delays: Vec<Duration> = policy.schedule().collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(250),
            ]
        );
    }

    #[test]
    fn test_zero_attempts_never_retries() {
        let policy = ReconnectPolicy::new(0, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(policy.schedule().count(), 0);
    }
}
