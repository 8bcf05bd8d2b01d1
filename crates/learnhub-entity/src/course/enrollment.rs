//! Enrollment entity and the outcome of a capacity-bounded enrollment write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A student's membership in a course.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    /// Unique enrollment identifier.
    pub id: Uuid,
    /// The course enrolled in.
    pub course_id: Uuid,
    /// The enrolled student.
    pub student_id: Uuid,
    /// Denormalized student display name at enrollment time.
    pub student_name: String,
    /// When the enrollment was created.
    pub enrolled_at: DateTime<Utc>,
    /// Completion percentage, 0-100.
    pub progress: i32,
    /// Lessons the student has completed.
    pub completed_lessons: Vec<Uuid>,
}

/// Outcome of the atomic capacity-bounded enrollment write.
///
/// The capacity predicate and the insert are evaluated inside one database
/// transaction holding the course row lock, so concurrent writers on the
/// same course serialize and the enrollment count can never exceed
/// `max_students`.
#[derive(Debug, Clone)]
pub enum EnrollOutcome {
    /// The student was added; carries the new enrollment record.
    Enrolled(Enrollment),
    /// An enrollment for this `(course, student)` pair already exists.
    AlreadyEnrolled,
    /// The course is at capacity.
    CapacityExceeded,
}
