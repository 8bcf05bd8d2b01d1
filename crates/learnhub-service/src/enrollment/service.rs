//! Enrollment admission — the synchronous front door of the pipeline.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use learnhub_core::error::AppError;
use learnhub_database::repositories::course::CourseRepository;
use learnhub_database::repositories::enrollment::EnrollmentRepository;
use learnhub_entity::job::payload::EnrollmentJobData;
use learnhub_entity::job::status::JobPriority;
use learnhub_queue::queue::EnrollmentQueue;

use crate::context::RequestContext;

/// Receipt for an admitted enrollment request.
#[derive(Debug, Clone)]
pub struct EnrollmentTicket {
    /// The enqueued job's identifier, pollable via the status API.
    pub job_id: Uuid,
}

/// Admits enrollment requests into the job queue.
///
/// Precondition checks here are cheap reads, not authoritative — the
/// worker re-validates everything, and the writer's unique constraint
/// settles any duplicate race against a concurrent enqueue. The request
/// never waits for the enrollment itself.
#[derive(Debug, Clone)]
pub struct EnrollmentService {
    /// Course repository for the publication precondition.
    course_repo: Arc<CourseRepository>,
    /// Enrollment repository for the duplicate precondition.
    enrollment_repo: Arc<EnrollmentRepository>,
    /// The job queue.
    queue: Arc<EnrollmentQueue>,
}

impl EnrollmentService {
    /// Creates a new enrollment service.
    pub fn new(
        course_repo: Arc<CourseRepository>,
        enrollment_repo: Arc<EnrollmentRepository>,
        queue: Arc<EnrollmentQueue>,
    ) -> Self {
        Self {
            course_repo,
            enrollment_repo,
            queue,
        }
    }

    /// Validate preconditions and enqueue an enrollment job, returning its
    /// id immediately.
    ///
    /// Precondition failures surface as validation errors; a queue outage
    /// surfaces as service-unavailable. Neither leaves partial state.
    pub async fn request_enrollment(
        &self,
        ctx: &RequestContext,
        course_id: Uuid,
        priority: Option<i32>,
    ) -> Result<EnrollmentTicket, AppError> {
        if !ctx.is_student() {
            return Err(AppError::validation("Only students can enroll in courses"));
        }

        let course = self
            .course_repo
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| AppError::validation("Course not found"))?;

        if !course.is_published {
            return Err(AppError::validation("Course is not published"));
        }

        if self
            .enrollment_repo
            .find_by_course_and_student(course_id, ctx.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::validation(
                "Student is already enrolled in this course",
            ));
        }

        let data = EnrollmentJobData {
            course_id,
            student_id: ctx.user_id,
        };
        let priority = priority.map(JobPriority::from).unwrap_or_default();

        let job = self.queue.enqueue(&data, priority).await?;

        info!(
            job_id = %job.id,
            course_id = %course_id,
            student_id = %ctx.user_id,
            priority = %job.priority,
            "Enrollment request admitted"
        );

        Ok(EnrollmentTicket { job_id: job.id })
    }
}
