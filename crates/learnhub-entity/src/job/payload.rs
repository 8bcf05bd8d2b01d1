//! Typed payload for enrollment jobs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use learnhub_core::{AppError, AppResult};

use super::model::Job;

/// Payload of an `enroll_student` job.
///
/// Serialized camelCase to match the persisted job record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentJobData {
    /// Target course.
    pub course_id: Uuid,
    /// Enrolling student.
    pub student_id: Uuid,
}

impl EnrollmentJobData {
    /// Serialize into a job payload value.
    pub fn to_value(&self) -> AppResult<serde_json::Value> {
        serde_json::to_value(self).map_err(AppError::from)
    }

    /// Parse the payload of a job back into typed data.
    pub fn from_job(job: &Job) -> AppResult<Self> {
        serde_json::from_value(job.payload.clone())
            .map_err(|e| AppError::validation(format!("Malformed enrollment job payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_uses_camel_case_keys() {
        let data = EnrollmentJobData {
            course_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
        };
        let value = data.to_value().unwrap();
        assert!(value.get("courseId").is_some());
        assert!(value.get("studentId").is_some());
        assert!(value.get("course_id").is_none());

        let back: EnrollmentJobData = serde_json::from_value(value).unwrap();
        assert_eq!(back, data);
    }
}
