//! Cron scheduler for periodic queue maintenance.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use learnhub_core::error::AppError;

use crate::queue::EnrollmentQueue;

/// Schedules stalled-job recovery and finished-job pruning.
pub struct MaintenanceScheduler {
    /// The underlying cron scheduler.
    scheduler: JobScheduler,
    /// Queue the maintenance tasks operate on.
    queue: Arc<EnrollmentQueue>,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler").finish()
    }
}

impl MaintenanceScheduler {
    /// Create a new maintenance scheduler.
    pub async fn new(queue: Arc<EnrollmentQueue>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler, queue })
    }

    /// Register the default maintenance tasks.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_stall_sweep().await?;
        self.register_prune().await?;
        tracing::info!("Queue maintenance tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Maintenance scheduler started");
        Ok(())
    }

    /// Shut down the scheduler.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.scheduler
            .clone()
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Maintenance scheduler shut down");
        Ok(())
    }

    /// Stalled-job sweep — every 30 seconds.
    ///
    /// Actives whose heartbeat went silent for the configured stall
    /// interval are re-leased while attempts remain, failed otherwise.
    async fn register_stall_sweep(&self) -> Result<(), AppError> {
        let queue = Arc::clone(&self.queue);
        let job = CronJob::new_async("*/30 * * * * *", move |_uuid, _lock| {
            let queue = Arc::clone(&queue);
            Box::pin(async move {
                if let Err(e) = queue.reclaim_stalled().await {
                    tracing::error!("Stalled-job sweep failed: {e}");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create stall sweep: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add stall sweep: {e}")))?;

        tracing::info!("Registered: stalled-job sweep (every 30s)");
        Ok(())
    }

    /// Finished-job pruning — every 5 minutes.
    async fn register_prune(&self) -> Result<(), AppError> {
        let queue = Arc::clone(&self.queue);
        let job = CronJob::new_async("0 */5 * * * *", move |_uuid, _lock| {
            let queue = Arc::clone(&queue);
            Box::pin(async move {
                if let Err(e) = queue.prune_finished().await {
                    tracing::error!("Finished-job pruning failed: {e}");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create prune task: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add prune task: {e}")))?;

        tracing::info!("Registered: finished-job pruning (every 5min)");
        Ok(())
    }
}
