//! Job status, queue statistics, and best-effort cancellation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use learnhub_core::error::AppError;
use learnhub_entity::job::model::Job;
use learnhub_entity::job::status::JobStatus;
use learnhub_queue::queue::{EnrollmentQueue, QueueStats};

/// Client-facing view of a job record.
///
/// Serialized camelCase — this is the persisted job record shape clients
/// poll against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    /// Job identifier.
    pub id: Uuid,
    /// Current status.
    pub status: JobStatus,
    /// Progress percentage, absent until the first report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<i32>,
    /// Business outcome, present once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Last failure reason, present once failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the job was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the job was first leased.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobStatusView {
    /// Build the view from a stored job record.
    pub fn from_job(job: Job) -> Self {
        Self {
            id: job.id,
            status: job.status,
            progress: job.progress,
            result: job.result,
            error: job.error_message,
            created_at: job.created_at,
            processed_at: job.processed_at,
            finished_at: job.finished_at,
        }
    }
}

/// Read-only job lookups, aggregate statistics, and cancellation.
#[derive(Debug, Clone)]
pub struct QueueStatusService {
    /// The job queue.
    queue: Arc<EnrollmentQueue>,
}

impl QueueStatusService {
    /// Creates a new queue status service.
    pub fn new(queue: Arc<EnrollmentQueue>) -> Self {
        Self { queue }
    }

    /// Look up a job's status. Status is eventually consistent with worker
    /// state: a lease taken moments ago on another worker may not be
    /// visible yet.
    pub async fn job_status(&self, job_id: Uuid) -> Result<Option<JobStatusView>, AppError> {
        Ok(self.queue.get(job_id).await?.map(JobStatusView::from_job))
    }

    /// Aggregate queue statistics.
    pub async fn queue_stats(&self) -> Result<QueueStats, AppError> {
        self.queue.stats().await
    }

    /// Cancel a job that has not started. Returns false (not an error)
    /// when the job is already active, finished, or unknown.
    pub async fn cancel(&self, job_id: Uuid) -> Result<bool, AppError> {
        self.queue.remove(job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_entity::job::status::JobPriority;

    fn stored_job() -> Job {
        Job {
            id: Uuid::new_v4(),
            job_type: "enroll_student".to_string(),
            payload: serde_json::json!({}),
            priority: JobPriority::NORMAL,
            status: JobStatus::Waiting,
            progress: None,
            result: None,
            error_message: None,
            attempts: 0,
            max_attempts: 3,
            run_at: None,
            heartbeat_at: None,
            worker_id: None,
            created_at: Utc::now(),
            processed_at: None,
            finished_at: None,
        }
    }

    #[test]
    fn test_fresh_job_view_has_no_progress() {
        let view = JobStatusView::from_job(stored_job());
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["status"], "waiting");
        assert!(value.get("progress").is_none());
        assert!(value.get("result").is_none());
        assert!(value.get("error").is_none());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("processedAt").is_none());
    }

    #[test]
    fn test_terminal_view_uses_camel_case_timestamps() {
        let mut job = stored_job();
        job.status = JobStatus::Completed;
        job.progress = Some(100);
        job.result = Some(serde_json::json!({"success": true}));
        job.processed_at = Some(job.created_at);
        job.finished_at = Some(job.created_at);

        let value = serde_json::to_value(JobStatusView::from_job(job)).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["progress"], 100);
        assert!(value.get("processedAt").is_some());
        assert!(value.get("finishedAt").is_some());
        assert!(value.get("processed_at").is_none());
    }
}
