//! Enrollment queue and worker pool configuration.

use serde::{Deserialize, Serialize};

/// Settings for the enrollment job queue and its worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Whether the worker pool is started with the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of concurrent job processing slots.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in milliseconds between job queue polls when idle.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Maximum retry attempts before a job is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// Base delay in milliseconds for exponential retry backoff.
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    /// Seconds an active job may go without a heartbeat before it is
    /// considered stalled and eligible for re-lease.
    #[serde(default = "default_stall_interval")]
    pub stall_interval_seconds: i64,
    /// How many completed jobs to retain when pruning.
    #[serde(default = "default_keep_completed")]
    pub keep_completed: i64,
    /// How many failed jobs to retain when pruning.
    #[serde(default = "default_keep_failed")]
    pub keep_failed: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            poll_interval_ms: default_poll_interval(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            stall_interval_seconds: default_stall_interval(),
            keep_completed: default_keep_completed(),
            keep_failed: default_keep_failed(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    5
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_max_attempts() -> i32 {
    3
}

fn default_backoff_base() -> u64 {
    2000
}

fn default_stall_interval() -> i64 {
    30
}

fn default_keep_completed() -> i64 {
    10
}

fn default_keep_failed() -> i64 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueueConfig::default();
        assert!(config.enabled);
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff_base_ms, 2000);
        assert_eq!(config.stall_interval_seconds, 30);
    }
}
