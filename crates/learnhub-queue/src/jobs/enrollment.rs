//! Student enrollment job handler.
//!
//! Re-validates everything the admission check saw (the queue introduces a
//! delay during which any of it may have changed) and then performs the
//! capacity-bounded atomic write. Business-rule failures complete the job
//! with `success = false`; only infrastructure errors are retried.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use learnhub_core::error::{AppError, ErrorKind};
use learnhub_database::repositories::course::CourseRepository;
use learnhub_database::repositories::enrollment::EnrollmentRepository;
use learnhub_database::repositories::user::UserRepository;
use learnhub_entity::course::EnrollOutcome;
use learnhub_entity::job::model::Job;
use learnhub_entity::job::payload::EnrollmentJobData;
use learnhub_entity::job::result::EnrollmentResult;

use crate::executor::{JobExecutionError, JobHandler, ProgressSink};
use crate::queue::ENROLL_STUDENT;

/// Handles `enroll_student` jobs.
#[derive(Debug)]
pub struct EnrollmentJobHandler {
    /// User repository, for the role check.
    user_repo: Arc<UserRepository>,
    /// Course repository, for the publication check.
    course_repo: Arc<CourseRepository>,
    /// Enrollment repository, owner of the atomic conditional write.
    enrollment_repo: Arc<EnrollmentRepository>,
}

impl EnrollmentJobHandler {
    /// Create a new enrollment job handler.
    pub fn new(
        user_repo: Arc<UserRepository>,
        course_repo: Arc<CourseRepository>,
        enrollment_repo: Arc<EnrollmentRepository>,
    ) -> Self {
        Self {
            user_repo,
            course_repo,
            enrollment_repo,
        }
    }
}

/// Serialize a business-rule rejection into the job's result value.
fn rejection(reason: &str) -> Result<Value, JobExecutionError> {
    serde_json::to_value(EnrollmentResult::rejected(reason))
        .map_err(|e| JobExecutionError::Permanent(format!("Failed to encode result: {e}")))
}

/// Map a collaborator error into an execution error: transient
/// infrastructure conditions are retried, everything else fails outright.
fn classify(e: AppError) -> JobExecutionError {
    if e.is_retryable() {
        JobExecutionError::Transient(e.to_string())
    } else {
        JobExecutionError::Permanent(e.to_string())
    }
}

#[async_trait]
impl JobHandler for EnrollmentJobHandler {
    fn job_type(&self) -> &str {
        ENROLL_STUDENT
    }

    async fn execute(
        &self,
        job: &Job,
        progress: &dyn ProgressSink,
    ) -> Result<Value, JobExecutionError> {
        let data = EnrollmentJobData::from_job(job)
            .map_err(|e| JobExecutionError::Permanent(e.message))?;

        progress.report(job.id, 10).await;

        // Step 1: the acting user must exist and hold the student role.
        let student = self
            .user_repo
            .find_by_id(data.student_id)
            .await
            .map_err(classify)?;
        let student = match student {
            Some(user) if user.role.is_student() => user,
            _ => return rejection("Only students can enroll in courses"),
        };

        progress.report(job.id, 30).await;

        // Step 2: the course must exist and be published.
        let course = self
            .course_repo
            .find_by_id(data.course_id)
            .await
            .map_err(classify)?;
        let course = match course {
            Some(course) => course,
            None => return rejection("Course not found"),
        };
        if !course.is_published {
            return rejection("Course is not published");
        }

        progress.report(job.id, 50).await;

        // Step 3: fast duplicate check. The unique constraint inside the
        // writer settles any race this read misses.
        let existing = self
            .enrollment_repo
            .find_by_course_and_student(data.course_id, data.student_id)
            .await
            .map_err(classify)?;
        if existing.is_some() {
            return rejection("Student is already enrolled in this course");
        }

        progress.report(job.id, 70).await;

        // Step 4: the capacity-bounded atomic write.
        let outcome = match self
            .enrollment_repo
            .try_enroll(data.course_id, data.student_id, &student.username)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) if e.kind == ErrorKind::NotFound => return rejection("Course not found"),
            Err(e) => return Err(classify(e)),
        };

        progress.report(job.id, 90).await;

        // Step 5: surface the outcome in the job result.
        let result = match outcome {
            EnrollOutcome::Enrolled(enrollment) => {
                tracing::info!(
                    course_id = %data.course_id,
                    student_id = %data.student_id,
                    enrollment_id = %enrollment.id,
                    "Student enrolled"
                );
                EnrollmentResult::succeeded(enrollment.id)
            }
            EnrollOutcome::AlreadyEnrolled => {
                EnrollmentResult::rejected("Student is already enrolled in this course")
            }
            EnrollOutcome::CapacityExceeded => {
                EnrollmentResult::rejected("Course is full or not available for enrollment")
            }
        };

        progress.report(job.id, 100).await;

        serde_json::to_value(&result)
            .map_err(|e| JobExecutionError::Permanent(format!("Failed to encode result: {e}")))
    }
}
