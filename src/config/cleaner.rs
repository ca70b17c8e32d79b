//! Cleaner tunables.
//!
//! Every field here is compared by the reconfiguration path; a change to any
//! one of them restarts the worker pools.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SweeprError};

/// Files at or above this size go to the large lane (64 MiB).
pub const DEFAULT_THROTTLE_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Initial capacity of each lane.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10240;

/// Worker threads per tier.
pub const DEFAULT_THREAD_COUNT: usize = 1;

/// How long a caller waits on one deletion.
pub const DEFAULT_TASK_TIMEOUT_MS: u64 = 60_000;

/// How often a waiting caller re-checks a pending deletion.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Tunables for the deletion scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CleanerConfig {
    /// Byte size splitting large from small files.
    #[serde(rename = "throttle-threshold")]
    pub throttle_threshold: u64,

    /// Capacity of the large lane.
    #[serde(rename = "large-queue-capacity")]
    pub large_queue_capacity: usize,

    /// Capacity of the small lane.
    #[serde(rename = "small-queue-capacity")]
    pub small_queue_capacity: usize,

    /// Worker threads serving the large lane.
    #[serde(rename = "large-thread-count")]
    pub large_thread_count: usize,

    /// Worker threads serving the small lane.
    #[serde(rename = "small-thread-count")]
    pub small_thread_count: usize,

    /// Maximum time a caller waits for one task, in milliseconds.
    #[serde(rename = "task-timeout-ms")]
    pub task_timeout_ms: u64,

    /// Re-check granularity while waiting, in milliseconds.
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            throttle_threshold: DEFAULT_THROTTLE_THRESHOLD,
            large_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            small_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            large_thread_count: DEFAULT_THREAD_COUNT,
            small_thread_count: DEFAULT_THREAD_COUNT,
            task_timeout_ms: DEFAULT_TASK_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl CleanerConfig {
    /// Set the large/small split point.
    pub fn with_throttle_threshold(mut self, bytes: u64) -> Self {
        self.throttle_threshold = bytes;
        self
    }

    /// Set both lane capacities.
    pub fn with_queue_capacities(mut self, large: usize, small: usize) -> Self {
        self.large_queue_capacity = large;
        self.small_queue_capacity = small;
        self
    }

    /// Set both worker counts.
    pub fn with_thread_counts(mut self, large: usize, small: usize) -> Self {
        self.large_thread_count = large;
        self.small_thread_count = small;
        self
    }

    /// Set the per-task wait bound and the re-check interval.
    pub fn with_timeouts(mut self, task_timeout: Duration, poll_interval: Duration) -> Self {
        self.task_timeout_ms = u64::try_from(task_timeout.as_millis()).unwrap_or(u64::MAX);
        self.poll_interval_ms = u64::try_from(poll_interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.large_thread_count == 0 {
            return Err(SweeprError::InvalidConfig("large-thread-count must be > 0".to_string()));
        }
        if self.small_thread_count == 0 {
            return Err(SweeprError::InvalidConfig("small-thread-count must be > 0".to_string()));
        }
        if self.large_queue_capacity == 0 {
            return Err(SweeprError::InvalidConfig("large-queue-capacity must be > 0".to_string()));
        }
        if self.small_queue_capacity == 0 {
            return Err(SweeprError::InvalidConfig("small-queue-capacity must be > 0".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(SweeprError::InvalidConfig("poll-interval-ms must be > 0".to_string()));
        }
        Ok(())
    }

    /// Compare against `self`, logging each tunable that differs.
    ///
    /// Returns true if anything changed.
    pub fn log_changes(&self, next: &CleanerConfig) -> bool {
        let mut updated = false;
        if self.throttle_threshold != next.throttle_threshold {
            log::debug!(
                "Updating throttle threshold, from {} to {}",
                self.throttle_threshold,
                next.throttle_threshold
            );
            updated = true;
        }
        if self.large_queue_capacity != next.large_queue_capacity {
            log::debug!(
                "Updating large queue capacity, from {} to {}",
                self.large_queue_capacity,
                next.large_queue_capacity
            );
            updated = true;
        }
        if self.small_queue_capacity != next.small_queue_capacity {
            log::debug!(
                "Updating small queue capacity, from {} to {}",
                self.small_queue_capacity,
                next.small_queue_capacity
            );
            updated = true;
        }
        if self.large_thread_count != next.large_thread_count {
            log::debug!(
                "Updating large thread count, from {} to {}",
                self.large_thread_count,
                next.large_thread_count
            );
            updated = true;
        }
        if self.small_thread_count != next.small_thread_count {
            log::debug!(
                "Updating small thread count, from {} to {}",
                self.small_thread_count,
                next.small_thread_count
            );
            updated = true;
        }
        if self.task_timeout_ms != next.task_timeout_ms {
            log::debug!("Updating task timeout, from {}ms to {}ms", self.task_timeout_ms, next.task_timeout_ms);
            updated = true;
        }
        if self.poll_interval_ms != next.poll_interval_ms {
            log::debug!(
                "Updating poll interval, from {}ms to {}ms",
                self.poll_interval_ms,
                next.poll_interval_ms
            );
            updated = true;
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = CleanerConfig::default();
        assert_eq!(config.throttle_threshold, 64 * 1024 * 1024);
        assert_eq!(config.large_queue_capacity, 10240);
        assert_eq!(config.small_thread_count, 1);
        assert_eq!(config.task_timeout(), Duration::from_secs(60));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_builder() {
        let config = CleanerConfig::default()
            .with_throttle_threshold(65536)
            .with_queue_capacities(8, 4)
            .with_thread_counts(2, 3)
            .with_timeouts(Duration::from_millis(50), Duration::from_millis(10));

        assert_eq!(config.throttle_threshold, 65536);
        assert_eq!(config.large_queue_capacity, 8);
        assert_eq!(config.small_queue_capacity, 4);
        assert_eq!(config.large_thread_count, 2);
        assert_eq!(config.small_thread_count, 3);
        assert_eq!(config.task_timeout_ms, 50);
        assert_eq!(config.poll_interval_ms, 10);
    }

    #[test]
    fn test_timeouts_saturate() {
        let config = CleanerConfig::default().with_timeouts(Duration::MAX, Duration::from_secs(u64::MAX));

        assert_eq!(config.task_timeout_ms, u64::MAX);
        assert_eq!(config.poll_interval_ms, u64::MAX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(CleanerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_zero_threads() {
        let config = CleanerConfig::default().with_thread_counts(0, 1);
        assert!(matches!(config.validate(), Err(SweeprError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_zero_capacity() {
        let config = CleanerConfig::default().with_queue_capacities(1, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_zero_poll_interval() {
        let config = CleanerConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_changes() {
        let current = CleanerConfig::default();
        assert!(!current.log_changes(&current.clone()));

        let next = current.clone().with_throttle_threshold(10);
        assert!(current.log_changes(&next));

        let next = CleanerConfig {
            poll_interval_ms: 5,
            ..Default::default()
        };
        assert!(current.log_changes(&next));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
throttle-threshold: 65536
small-thread-count: 4
task-timeout-ms: 500
"#;
        let config: CleanerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.throttle_threshold, 65536);
        assert_eq!(config.small_thread_count, 4);
        assert_eq!(config.task_timeout_ms, 500);
        // Other fields should have defaults
        assert_eq!(config.large_thread_count, 1);
        assert_eq!(config.poll_interval_ms, 1000);
    }
}
