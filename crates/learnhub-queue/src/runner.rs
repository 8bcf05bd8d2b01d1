//! Worker runner — a bounded pool that leases jobs and executes them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::time;
use tracing;

use crate::executor::{JobExecutionError, JobExecutor, ProgressSink};
use crate::queue::EnrollmentQueue;

/// Polls the queue and executes jobs with bounded concurrency.
///
/// The semaphore caps in-flight jobs at the configured pool size; each
/// permit is one worker slot processing at most one job. The pool size is
/// the application-level backpressure bound on concurrent enrollment
/// writers.
#[derive(Debug)]
pub struct WorkerRunner {
    /// Job queue for leasing and resolution.
    queue: Arc<EnrollmentQueue>,
    /// Job executor for dispatching.
    executor: Arc<JobExecutor>,
    /// Worker identifier recorded on leases.
    worker_id: String,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(queue: Arc<EnrollmentQueue>, executor: Arc<JobExecutor>, worker_id: String) -> Self {
        Self {
            queue,
            executor,
            worker_id,
        }
    }

    /// Run until the shutdown signal flips, then drain in-flight jobs.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let config = self.queue.config().clone();

        tracing::info!(
            worker_id = %self.worker_id,
            concurrency = config.concurrency,
            poll_interval_ms = config.poll_interval_ms,
            "Worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(config.concurrency));
        let poll_interval = Duration::from_millis(config.poll_interval_ms);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let leased = self.poll_and_execute(&semaphore).await;

            // Poll again immediately while work keeps coming; sleep only
            // when the queue is empty or all slots are busy.
            if !leased {
                tokio::select! {
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = time::sleep(poll_interval) => {}
                }
            }
        }

        tracing::info!(
            worker_id = %self.worker_id,
            "Worker pool draining in-flight jobs..."
        );

        let all_permits = config.concurrency as u32;
        let _ = time::timeout(Duration::from_secs(30), semaphore.acquire_many(all_permits)).await;

        tracing::info!(worker_id = %self.worker_id, "Worker pool shut down");
    }

    /// Lease one job and spawn its execution. Returns whether a job was
    /// leased (the caller uses this to decide whether to sleep).
    async fn poll_and_execute(&self, semaphore: &Arc<Semaphore>) -> bool {
        let permit = match Arc::clone(semaphore).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => return false,
        };

        let slot_id = format!("{}-{}", self.worker_id, semaphore.available_permits());

        match self.queue.lease(&slot_id).await {
            Ok(Some(job)) => {
                let queue = Arc::clone(&self.queue);
                let executor = Arc::clone(&self.executor);

                tokio::spawn(async move {
                    let _permit = permit;
                    let job_id = job.id;

                    // Every handler outcome resolves the job; no error may
                    // escape the slot or leak into another job.
                    let progress: &dyn ProgressSink = queue.as_ref();
                    match executor.execute(&job, progress).await {
                        Ok(result) => {
                            if let Err(e) = queue.complete(job_id, &result).await {
                                tracing::error!(job_id = %job_id, "Failed to complete job: {e}");
                            }
                        }
                        Err(JobExecutionError::Transient(msg)) => {
                            if let Err(e) = queue.resolve_failure(&job, &msg).await {
                                tracing::error!(job_id = %job_id, "Failed to resolve job: {e}");
                            }
                        }
                        Err(JobExecutionError::Permanent(msg)) => {
                            if let Err(e) = queue.fail(job_id, &msg).await {
                                tracing::error!(job_id = %job_id, "Failed to fail job: {e}");
                            }
                        }
                    }
                });

                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::error!(worker_id = %self.worker_id, "Failed to lease job: {e}");
                false
            }
        }
    }
}
