//! Job status enumeration and priority ordering key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an enrollment job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting to be leased by a worker.
    Waiting,
    /// Currently held by a worker slot.
    Active,
    /// Finished; the business outcome (success or failure) is in `result`.
    Completed,
    /// Exhausted all retry attempts on infrastructure errors.
    Failed,
    /// Scheduled for a future time. Part of the status contract; current
    /// callers keep backed-off jobs `waiting` with a future run time.
    Delayed,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if the job may still be cancelled.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Delayed => "delayed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Priority ordering key for enrollment jobs.
///
/// Four named tiers exist, but any integer is accepted and used as-is for
/// ordering — the admission surface does not validate the value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct JobPriority(pub i32);

impl JobPriority {
    /// Lowest tier.
    pub const LOW: Self = Self(1);
    /// Default tier.
    pub const NORMAL: Self = Self(5);
    /// Elevated tier.
    pub const HIGH: Self = Self(10);
    /// Highest tier.
    pub const CRITICAL: Self = Self(15);

    /// Name of the tier, if the value matches one.
    pub fn tier_name(&self) -> Option<&'static str> {
        match *self {
            Self::LOW => Some("low"),
            Self::NORMAL => Some("normal"),
            Self::HIGH => Some("high"),
            Self::CRITICAL => Some("critical"),
            _ => None,
        }
    }
}

impl Default for JobPriority {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<i32> for JobPriority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tier_name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Waiting.is_terminal());
        assert!(!JobStatus::Active.is_terminal());
        assert!(!JobStatus::Delayed.is_terminal());
    }

    #[test]
    fn test_only_waiting_is_cancellable() {
        assert!(JobStatus::Waiting.is_cancellable());
        assert!(!JobStatus::Active.is_cancellable());
        assert!(!JobStatus::Completed.is_cancellable());
        assert!(!JobStatus::Failed.is_cancellable());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Waiting).unwrap(),
            "\"waiting\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Active).unwrap(),
            "\"active\""
        );
    }

    #[test]
    fn test_priority_tiers() {
        assert_eq!(JobPriority::LOW.0, 1);
        assert_eq!(JobPriority::NORMAL.0, 5);
        assert_eq!(JobPriority::HIGH.0, 10);
        assert_eq!(JobPriority::CRITICAL.0, 15);
        assert_eq!(JobPriority::default(), JobPriority::NORMAL);
    }

    #[test]
    fn test_unrecognized_priority_is_accepted() {
        let odd = JobPriority::from(42);
        assert_eq!(odd.tier_name(), None);
        assert_eq!(odd.to_string(), "42");
        assert!(odd > JobPriority::CRITICAL);
    }

    #[test]
    fn test_priority_serializes_as_bare_integer() {
        assert_eq!(serde_json::to_string(&JobPriority::HIGH).unwrap(), "10");
        let parsed: JobPriority = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, JobPriority(7));
    }
}
