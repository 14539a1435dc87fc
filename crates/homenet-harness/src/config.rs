//! Timing configuration for condition polling

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default interval between two attempts of the same condition
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default deadline for a single condition
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(900);

/// Polling interval and deadlines applied to every condition of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between two attempts
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Deadline for `wait_for_unit`
    #[serde(with = "humantime_serde")]
    pub unit_timeout: Duration,
    /// Deadline for `wait_until_succeeds`
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            unit_timeout: DEFAULT_TIMEOUT,
            command_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TimingConfig {
    /// Create a configuration with short deadlines for tests
    pub fn fast(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            unit_timeout: timeout,
            command_timeout: timeout,
        }
    }

    /// Apply one deadline to both condition kinds
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.unit_timeout = timeout;
        self.command_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_defaults() {
        let timing = TimingConfig::default();
        assert_eq!(timing.poll_interval, Duration::from_secs(1));
        assert_eq!(timing.unit_timeout, Duration::from_secs(900));
        assert_eq!(timing.command_timeout, Duration::from_secs(900));
    }

    #[test]
    fn test_timing_humantime_fields() {
        let timing: TimingConfig = toml::from_str(
            r#"
            poll_interval = "250ms"
            unit_timeout = "2m"
            "#,
        )
        .unwrap();
        assert_eq!(timing.poll_interval, Duration::from_millis(250));
        assert_eq!(timing.unit_timeout, Duration::from_secs(120));
        // Missing fields fall back to defaults
        assert_eq!(timing.command_timeout, DEFAULT_TIMEOUT);
    }
}
