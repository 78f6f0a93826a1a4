use std::time::Duration;

use reelgen_core::limits::{DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_POLL_INTERVAL};

/// Shortest delay the poll loop will use; a zero interval is raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Tunable parameters for the job poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay between two status checks. The first check is immediate.
    pub interval: Duration,
    /// Consecutive transport failures tolerated. One more fails the job.
    pub max_consecutive_failures: u32,
}

impl PollerConfig {
    /// The interval the poll loop actually waits, never below
    /// [`MIN_POLL_INTERVAL`].
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_raised_to_minimum() {
        let config = PollerConfig {
            interval: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(config.effective_interval(), MIN_POLL_INTERVAL);
        assert_eq!(PollerConfig::default().effective_interval(), DEFAULT_POLL_INTERVAL);
    }
}
