//! Job repository implementation — the durable queue's storage operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use learnhub_core::error::{AppError, ErrorKind};
use learnhub_core::result::AppResult;
use learnhub_entity::job::model::{CreateJob, Job};
use learnhub_entity::job::status::JobStatus;

/// Repository for enrollment job persistence and atomic queue operations.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a job by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }

    /// Insert a new waiting job. The INSERT is acknowledged only after the
    /// row is durable, so a returned job is guaranteed to survive restarts.
    pub async fn create(&self, data: &CreateJob) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (id, job_type, payload, priority, max_attempts) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.job_type)
        .bind(&data.payload)
        .bind(data.priority)
        .bind(data.max_attempts)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create job", e))
    }

    /// Lease the next runnable job: the highest-priority `waiting` job whose
    /// backoff has elapsed, ties broken by earliest creation.
    ///
    /// `FOR UPDATE SKIP LOCKED` makes the selection-and-flip atomic across
    /// concurrent workers — no two callers can lease the same row.
    pub async fn lease(&self, worker_id: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'active', processed_at = NOW(), \
             heartbeat_at = NOW(), worker_id = $1 \
             WHERE id = ( \
                SELECT id FROM jobs \
                WHERE status = 'waiting' AND (run_at IS NULL OR run_at <= NOW()) \
                ORDER BY priority DESC, created_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lease job", e))
    }

    /// Record progress on an active job. No-op (returns false) if the job
    /// is not `active`.
    pub async fn report_progress(&self, id: Uuid, percent: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET progress = $2, heartbeat_at = NOW() \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .bind(percent)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to report progress", e))?;

        Ok(result.rows_affected() == 1)
    }

    /// Transition an active job to `completed` with its business result.
    pub async fn complete(&self, id: Uuid, result: &serde_json::Value) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'completed', result = $2, finished_at = NOW() \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .bind(result)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete job", e))?;
        Ok(())
    }

    /// Return an active job to `waiting` for a retry, bumping the attempt
    /// counter and scheduling the earliest next lease time.
    pub async fn schedule_retry(
        &self,
        id: Uuid,
        error_message: &str,
        run_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'waiting', attempts = attempts + 1, \
             error_message = $2, run_at = $3, worker_id = NULL \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .bind(error_message)
        .bind(run_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to schedule retry", e))?;
        Ok(())
    }

    /// Transition an active job to terminal `failed`.
    pub async fn fail(&self, id: Uuid, error_message: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'failed', error_message = $2, finished_at = NOW() \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark job failed", e))?;
        Ok(())
    }

    /// Remove a job, permitted only while it is still `waiting`.
    /// Returns false when the job has started, finished, or does not exist.
    pub async fn remove_waiting(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1 AND status = 'waiting'")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove job", e))?;

        Ok(result.rows_affected() == 1)
    }

    /// Count jobs in a given status.
    pub async fn count_by_status(&self, status: JobStatus) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))
    }

    /// Reclaim jobs whose worker went silent: actives with a heartbeat older
    /// than the cutoff return to `waiting` while under the attempt ceiling,
    /// otherwise they are marked `failed`. Returns (requeued, failed) counts.
    pub async fn reclaim_stalled(&self, cutoff: DateTime<Utc>) -> AppResult<(u64, u64)> {
        let requeued = sqlx::query(
            "UPDATE jobs SET status = 'waiting', attempts = attempts + 1, \
             error_message = 'Job stalled', worker_id = NULL, run_at = NULL \
             WHERE status = 'active' AND heartbeat_at < $1 AND attempts < max_attempts",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to requeue stalled jobs", e)
        })?
        .rows_affected();

        let failed = sqlx::query(
            "UPDATE jobs SET status = 'failed', error_message = 'Job stalled', \
             finished_at = NOW(), worker_id = NULL \
             WHERE status = 'active' AND heartbeat_at < $1 AND attempts >= max_attempts",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to fail stalled jobs", e)
        })?
        .rows_affected();

        Ok((requeued, failed))
    }

    /// Prune finished jobs, retaining only the most recently finished
    /// `keep_completed` completed and `keep_failed` failed rows.
    pub async fn prune_finished(&self, keep_completed: i64, keep_failed: i64) -> AppResult<u64> {
        let completed = sqlx::query(
            "DELETE FROM jobs WHERE status = 'completed' AND id NOT IN ( \
                SELECT id FROM jobs WHERE status = 'completed' \
                ORDER BY finished_at DESC NULLS LAST LIMIT $1 \
             )",
        )
        .bind(keep_completed)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to prune completed jobs", e)
        })?
        .rows_affected();

        let failed = sqlx::query(
            "DELETE FROM jobs WHERE status = 'failed' AND id NOT IN ( \
                SELECT id FROM jobs WHERE status = 'failed' \
                ORDER BY finished_at DESC NULLS LAST LIMIT $1 \
             )",
        )
        .bind(keep_failed)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to prune failed jobs", e)
        })?
        .rows_affected();

        Ok(completed + failed)
    }
}
