//! Enrollment repository — lookups plus the capacity-bounded atomic writer.

use sqlx::PgPool;
use uuid::Uuid;

use learnhub_core::error::{AppError, ErrorKind};
use learnhub_core::result::AppResult;
use learnhub_entity::course::{Course, EnrollOutcome, Enrollment};

/// Repository for enrollment rows and the atomic conditional-enroll write.
#[derive(Debug, Clone)]
pub struct EnrollmentRepository {
    pool: PgPool,
}

impl EnrollmentRepository {
    /// Create a new enrollment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an enrollment for a `(course, student)` pair.
    pub async fn find_by_course_and_student(
        &self,
        course_id: Uuid,
        student_id: Uuid,
    ) -> AppResult<Option<Enrollment>> {
        sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM enrollments WHERE course_id = $1 AND student_id = $2",
        )
        .bind(course_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find enrollment", e))
    }

    /// Count enrollments for a course.
    pub async fn count_for_course(&self, course_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM enrollments WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count enrollments", e)
            })
    }

    /// Atomically enroll a student if the course has capacity and the pair
    /// is not already enrolled.
    ///
    /// The capacity predicate and the insert run inside a single transaction
    /// that first takes the course row lock (`SELECT ... FOR UPDATE`), so
    /// concurrent writers on the same course serialize and each one counts
    /// the enrollments committed by every earlier lock holder. The unique
    /// index on `(course_id, student_id)` rejects duplicates regardless of
    /// interleaving. The decision is never made in application memory
    /// against a stale read.
    pub async fn try_enroll(
        &self,
        course_id: Uuid,
        student_id: Uuid,
        student_name: &str,
    ) -> AppResult<EnrollOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin enrollment", e)
        })?;

        let course =
            sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1 FOR UPDATE")
                .bind(course_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to lock course", e)
                })?
                .ok_or_else(|| AppError::not_found("Course not found"))?;

        if let Some(max_students) = course.max_students {
            let enrolled: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE course_id = $1")
                    .bind(course_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::with_source(ErrorKind::Database, "Failed to count enrollments", e)
                    })?;

            if enrolled >= i64::from(max_students) {
                tx.rollback().await.ok();
                return Ok(EnrollOutcome::CapacityExceeded);
            }
        }

        let inserted = sqlx::query_as::<_, Enrollment>(
            "INSERT INTO enrollments (id, course_id, student_id, student_name) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (course_id, student_id) DO NOTHING \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(student_id)
        .bind(student_name)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to insert enrollment", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit enrollment", e)
        })?;

        Ok(match inserted {
            Some(enrollment) => EnrollOutcome::Enrolled(enrollment),
            None => EnrollOutcome::AlreadyEnrolled,
        })
    }
}
