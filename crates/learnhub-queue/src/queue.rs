//! Job queue abstraction over the durable job store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing;
use uuid::Uuid;

use learnhub_core::config::queue::QueueConfig;
use learnhub_core::error::AppError;
use learnhub_database::repositories::job::JobRepository;
use learnhub_entity::job::model::{CreateJob, Job};
use learnhub_entity::job::payload::EnrollmentJobData;
use learnhub_entity::job::status::{JobPriority, JobStatus};

use crate::executor::ProgressSink;

/// Job type for student enrollment jobs.
pub const ENROLL_STUDENT: &str = "enroll_student";

/// How a processing failure was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureResolution {
    /// The job went back to `waiting` with a backoff delay.
    Retried,
    /// The attempt ceiling was exhausted; the job is terminally `failed`.
    Failed,
}

/// Durable queue of enrollment jobs.
///
/// All state transitions are single atomic statements in the job store;
/// the queue never holds job state in memory, so jobs survive restarts
/// and any worker in the pool can pick up where another left off.
#[derive(Debug, Clone)]
pub struct EnrollmentQueue {
    /// Job repository for persistence.
    repo: Arc<JobRepository>,
    /// Queue behavior configuration.
    config: QueueConfig,
}

impl EnrollmentQueue {
    /// Create a new enrollment queue.
    pub fn new(repo: Arc<JobRepository>, config: QueueConfig) -> Self {
        Self { repo, config }
    }

    /// Queue configuration in effect.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Enqueue an enrollment job. Durable before returning: the returned
    /// job id can always be polled to a terminal outcome.
    pub async fn enqueue(
        &self,
        data: &EnrollmentJobData,
        priority: JobPriority,
    ) -> Result<Job, AppError> {
        let create = CreateJob {
            job_type: ENROLL_STUDENT.to_string(),
            payload: data.to_value()?,
            priority,
            max_attempts: self.config.max_attempts,
        };

        let job = self.repo.create(&create).await.map_err(|e| {
            AppError::service_unavailable(format!("Enrollment queue unavailable: {e}"))
        })?;

        tracing::debug!(
            job_id = %job.id,
            course_id = %data.course_id,
            student_id = %data.student_id,
            priority = %job.priority,
            "Enqueued enrollment job"
        );

        Ok(job)
    }

    /// Lease the next runnable job for a worker slot, or `None` when the
    /// queue is empty. Callers poll on a bounded interval.
    pub async fn lease(&self, worker_id: &str) -> Result<Option<Job>, AppError> {
        let job = self.repo.lease(worker_id).await?;

        if let Some(ref job) = job {
            tracing::debug!(
                job_id = %job.id,
                worker_id,
                attempts = job.attempts,
                "Leased job"
            );
        }

        Ok(job)
    }

    /// Look up a job by id.
    pub async fn get(&self, job_id: Uuid) -> Result<Option<Job>, AppError> {
        self.repo.find_by_id(job_id).await
    }

    /// Complete an active job with its business result.
    pub async fn complete(&self, job_id: Uuid, result: &serde_json::Value) -> Result<(), AppError> {
        self.repo.complete(job_id, result).await?;
        tracing::debug!(job_id = %job_id, "Job completed");
        Ok(())
    }

    /// Resolve a retryable processing failure: back to `waiting` with
    /// exponential backoff while attempts remain, terminal `failed` once
    /// the ceiling is reached.
    pub async fn resolve_failure(
        &self,
        job: &Job,
        error: &str,
    ) -> Result<FailureResolution, AppError> {
        if job.can_retry() {
            let next_attempt = job.attempts + 1;
            let delay_ms = backoff_delay_ms(self.config.backoff_base_ms, next_attempt);
            let run_at = Utc::now() + Duration::milliseconds(delay_ms as i64);

            self.repo.schedule_retry(job.id, error, run_at).await?;

            tracing::warn!(
                job_id = %job.id,
                attempt = next_attempt,
                max_attempts = job.max_attempts,
                delay_ms,
                error,
                "Job failed, scheduled retry"
            );
            Ok(FailureResolution::Retried)
        } else {
            self.repo.fail(job.id, error).await?;
            tracing::error!(
                job_id = %job.id,
                attempts = job.attempts,
                error,
                "Job failed permanently"
            );
            Ok(FailureResolution::Failed)
        }
    }

    /// Mark an active job terminally failed without a retry.
    pub async fn fail(&self, job_id: Uuid, error: &str) -> Result<(), AppError> {
        self.repo.fail(job_id, error).await?;
        tracing::error!(job_id = %job_id, error, "Job failed");
        Ok(())
    }

    /// Remove a job that has not started. Returns false when the job is
    /// already active, finished, or unknown — callers treat that as a
    /// normal outcome, not an error.
    pub async fn remove(&self, job_id: Uuid) -> Result<bool, AppError> {
        let removed = self.repo.remove_waiting(job_id).await?;
        if removed {
            tracing::debug!(job_id = %job_id, "Job cancelled");
        }
        Ok(removed)
    }

    /// Point-in-time queue statistics. Counts are read independently, so
    /// they may lag concurrent transitions slightly.
    pub async fn stats(&self) -> Result<QueueStats, AppError> {
        let waiting = self.repo.count_by_status(JobStatus::Waiting).await?;
        let active = self.repo.count_by_status(JobStatus::Active).await?;
        let completed = self.repo.count_by_status(JobStatus::Completed).await?;
        let failed = self.repo.count_by_status(JobStatus::Failed).await?;

        Ok(QueueStats {
            waiting,
            active,
            completed,
            failed,
            total: waiting + active + completed + failed,
        })
    }

    /// Recover jobs whose worker stopped heartbeating: re-lease eligible
    /// ones, fail the rest. Returns (requeued, failed) counts.
    pub async fn reclaim_stalled(&self) -> Result<(u64, u64), AppError> {
        let cutoff = Utc::now() - Duration::seconds(self.config.stall_interval_seconds);
        let (requeued, failed) = self.repo.reclaim_stalled(cutoff).await?;

        if requeued > 0 || failed > 0 {
            tracing::warn!(requeued, failed, "Reclaimed stalled jobs");
        }
        Ok((requeued, failed))
    }

    /// Prune finished jobs beyond the configured retention.
    pub async fn prune_finished(&self) -> Result<u64, AppError> {
        let pruned = self
            .repo
            .prune_finished(self.config.keep_completed, self.config.keep_failed)
            .await?;

        if pruned > 0 {
            tracing::debug!(pruned, "Pruned finished jobs");
        }
        Ok(pruned)
    }
}

#[async_trait]
impl ProgressSink for EnrollmentQueue {
    async fn report(&self, job_id: Uuid, percent: i32) {
        // Progress is advisory; a failed report must not abort processing.
        match self.repo.report_progress(job_id, percent).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(job_id = %job_id, percent, "Progress ignored, job not active");
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, percent, "Failed to report progress: {e}");
            }
        }
    }
}

/// Exponential backoff delay for the given attempt number.
pub fn backoff_delay_ms(base_ms: u64, attempt: i32) -> u64 {
    base_ms.saturating_mul(1u64 << attempt.clamp(0, 16) as u32)
}

/// Queue statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs waiting for a worker slot.
    pub waiting: i64,
    /// Jobs currently being processed.
    pub active: i64,
    /// Jobs that reached a business outcome.
    pub completed: i64,
    /// Jobs that exhausted their retries.
    pub failed: i64,
    /// Sum of the above.
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay_ms(2000, 1), 4000);
        assert_eq!(backoff_delay_ms(2000, 2), 8000);
        assert_eq!(backoff_delay_ms(2000, 3), 16000);
    }

    #[test]
    fn test_backoff_is_clamped() {
        // Large attempt numbers must not overflow.
        assert_eq!(backoff_delay_ms(2000, 64), 2000 * (1 << 16));
        assert_eq!(backoff_delay_ms(2000, -1), 2000);
    }
}
