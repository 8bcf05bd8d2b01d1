//! Enrollment job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{JobPriority, JobStatus};

/// A queued enrollment job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier, assigned at enqueue time.
    pub id: Uuid,
    /// Job type identifier (e.g. `"enroll_student"`).
    pub job_type: String,
    /// Job-specific payload (JSON). Immutable after creation.
    pub payload: serde_json::Value,
    /// Ordering key; higher values are leased first.
    pub priority: JobPriority,
    /// Current job status.
    pub status: JobStatus,
    /// Progress percentage, 0-100. NULL until the first report.
    pub progress: Option<i32>,
    /// Business outcome (JSON), present once completed.
    pub result: Option<serde_json::Value>,
    /// Last infrastructure failure, present once failed.
    pub error_message: Option<String>,
    /// Number of retries performed so far.
    pub attempts: i32,
    /// Retry ceiling.
    pub max_attempts: i32,
    /// Earliest time the job may be leased (retry backoff).
    pub run_at: Option<DateTime<Utc>>,
    /// Last sign of life from the processing worker.
    pub heartbeat_at: Option<DateTime<Utc>>,
    /// Worker slot currently or last holding the lease.
    pub worker_id: Option<String>,
    /// When the job was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the job was first leased.
    pub processed_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Check if another retry is permitted.
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }
}

/// Data required to enqueue a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    /// Job type identifier.
    pub job_type: String,
    /// Job-specific payload.
    pub payload: serde_json::Value,
    /// Ordering key.
    pub priority: JobPriority,
    /// Retry ceiling.
    pub max_attempts: i32,
}
