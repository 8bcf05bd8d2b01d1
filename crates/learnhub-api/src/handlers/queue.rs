//! Queue status, statistics, and cancellation handlers.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use learnhub_core::error::AppError;
use learnhub_queue::queue::QueueStats;
use learnhub_service::enrollment::status::JobStatusView;

use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::rbac::require_instructor_or_admin;
use crate::state::AppState;

/// GET /api/queue/job/{job_id}
pub async fn job_status(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobStatusView>>, ApiError> {
    let view = state
        .queue_status_service
        .job_status(job_id)
        .await?
        .ok_or_else(|| AppError::not_found("Job not found"))?;

    Ok(Json(ApiResponse::ok(view)))
}

/// DELETE /api/queue/job/{job_id}
///
/// Cancellation is best-effort: it succeeds only while the job has not
/// started. An uncancellable or unknown job yields 404, not a fault.
pub async fn cancel_job(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let cancelled = state.queue_status_service.cancel(job_id).await?;

    if !cancelled {
        return Err(AppError::not_found("Job not found or cannot be cancelled").into());
    }

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Job cancelled successfully".to_string(),
    })))
}

/// GET /api/queue/stats
pub async fn queue_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<QueueStats>>, ApiError> {
    require_instructor_or_admin(&auth)?;

    let stats = state.queue_status_service.queue_stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}
