//! Course enrollment handler.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::dto::request::EnrollRequest;
use crate::dto::response::{ApiResponse, EnrollmentQueuedResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/courses/{id}/enroll
///
/// Admits the request into the enrollment queue and returns 202 with a
/// job id the client can poll. Never waits for the enrollment itself.
pub async fn enroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<Uuid>,
    Json(req): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EnrollmentQueuedResponse>>), ApiError> {
    let ticket = state
        .enrollment_service
        .request_enrollment(&auth, course_id, req.priority)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(EnrollmentQueuedResponse {
            job_id: ticket.job_id,
            status: "queued".to_string(),
            message: "Enrollment request queued. Poll the job status for the outcome."
                .to_string(),
        })),
    ))
}
