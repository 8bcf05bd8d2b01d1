//! Job executor — dispatches leased jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing;
use uuid::Uuid;

use learnhub_entity::job::model::Job;

/// Sink for job progress reports.
///
/// Implemented by the queue itself; handlers call it at protocol
/// checkpoints. Reports are advisory and must never fail the job.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Record progress for a job, 0-100.
    async fn report(&self, job_id: Uuid, percent: i32);
}

/// A progress sink that discards reports. Useful in tests.
#[derive(Debug, Default)]
pub struct NullProgress;

#[async_trait]
impl ProgressSink for NullProgress {
    async fn report(&self, _job_id: Uuid, _percent: i32) {}
}

/// Error from job execution.
///
/// Business-rule failures are **not** errors: handlers resolve those by
/// returning a result value with `success = false`, because retrying an
/// identical request cannot change a business outcome.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Transient infrastructure failure — eligible for retry with backoff.
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Permanent failure (unknown job type, malformed payload) — fail
    /// immediately without retrying.
    #[error("Permanent job failure: {0}")]
    Permanent(String),
}

/// Trait for job handler implementations.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// The job type this handler processes.
    fn job_type(&self) -> &str;

    /// Execute the job, reporting progress through the sink. The returned
    /// value becomes the job's persisted `result`.
    async fn execute(
        &self,
        job: &Job,
        progress: &dyn ProgressSink,
    ) -> Result<Value, JobExecutionError>;
}

/// Dispatches jobs to the appropriate handler based on `job_type`.
#[derive(Debug, Default)]
pub struct JobExecutor {
    /// Registered job handlers by type.
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job handler.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        tracing::info!("Registered job handler for type '{}'", job_type);
        self.handlers.insert(job_type, handler);
    }

    /// Execute a job by dispatching to the registered handler.
    pub async fn execute(
        &self,
        job: &Job,
        progress: &dyn ProgressSink,
    ) -> Result<Value, JobExecutionError> {
        let handler = self.handlers.get(&job.job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!(
                "No handler registered for job type '{}'",
                job.job_type
            ))
        })?;

        tracing::info!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempt = job.attempts + 1,
            "Executing job"
        );

        handler.execute(job, progress).await
    }

    /// Check if a handler is registered for a job type.
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use learnhub_entity::job::status::{JobPriority, JobStatus};

    #[derive(Debug)]
    struct EchoHandler;

    #[async_trait]
    impl JobHandler for EchoHandler {
        fn job_type(&self) -> &str {
            "echo"
        }

        async fn execute(
            &self,
            job: &Job,
            progress: &dyn ProgressSink,
        ) -> Result<Value, JobExecutionError> {
            progress.report(job.id, 100).await;
            Ok(job.payload.clone())
        }
    }

    fn test_job(job_type: &str) -> Job {
        Job {
            id: Uuid::new_v4(),
            job_type: job_type.to_string(),
            payload: serde_json::json!({"hello": "world"}),
            priority: JobPriority::NORMAL,
            status: JobStatus::Active,
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

    #[tokio::test]
    async fn test_dispatches_to_registered_handler() {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(EchoHandler));
        assert!(executor.has_handler("echo"));

        let job = test_job("echo");
        let result = executor.execute(&job, &NullProgress).await.unwrap();
        assert_eq!(result, serde_json::json!({"hello": "world"}));
    }

    #[tokio::test]
    async fn test_unknown_job_type_is_permanent() {
        let executor = JobExecutor::new();
        let job = test_job("mystery");
        let err = executor.execute(&job, &NullProgress).await.unwrap_err();
        assert!(matches!(err, JobExecutionError::Permanent(_)));
    }
}
