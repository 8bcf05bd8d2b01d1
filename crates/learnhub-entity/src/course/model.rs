//! Course entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A course offered on the platform.
///
/// Enrollment membership lives in the `enrollments` table, one row per
/// `(course, student)` pair; `max_students` bounds that set when present.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    /// Unique course identifier.
    pub id: Uuid,
    /// Course title.
    pub title: String,
    /// Course description.
    pub description: Option<String>,
    /// The instructor who owns the course.
    pub instructor_id: Uuid,
    /// Denormalized instructor display name.
    pub instructor_name: String,
    /// Whether students may enroll. Unpublished courses reject enrollment.
    pub is_published: bool,
    /// Enrollment capacity. `None` means unlimited.
    pub max_students: Option<i32>,
    /// When the course was created.
    pub created_at: DateTime<Utc>,
    /// When the course was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourse {
    /// Course title.
    pub title: String,
    /// Course description.
    pub description: Option<String>,
    /// Owning instructor.
    pub instructor_id: Uuid,
    /// Denormalized instructor display name.
    pub instructor_name: String,
    /// Whether the course is immediately open for enrollment.
    pub is_published: bool,
    /// Enrollment capacity. `None` means unlimited.
    pub max_students: Option<i32>,
}
