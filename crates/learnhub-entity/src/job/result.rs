//! Business outcome of an enrollment job.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome embedded in a completed job's `result` field.
///
/// Business-rule failures (role mismatch, unpublished course, duplicate
/// enrollment, capacity exceeded) complete the job with `success = false`
/// and a human-readable `error` — retrying cannot change those outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResult {
    /// Whether the enrollment was performed.
    pub success: bool,
    /// Identifier of the created enrollment, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_id: Option<Uuid>,
    /// Human-readable success message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Human-readable failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnrollmentResult {
    /// Successful enrollment.
    pub fn succeeded(enrollment_id: Uuid) -> Self {
        Self {
            success: true,
            enrollment_id: Some(enrollment_id),
            message: Some("Successfully enrolled in course".to_string()),
            error: None,
        }
    }

    /// Business-rule failure with a reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            enrollment_id: None,
            message: None,
            error: Some(reason.into()),
        }
    }
}
