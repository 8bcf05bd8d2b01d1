//! Role-based guards for route handlers.

use learnhub_core::error::AppError;

use crate::extractors::AuthUser;

/// Checks that the authenticated user is an instructor or admin.
pub fn require_instructor_or_admin(auth: &AuthUser) -> Result<(), AppError> {
    if !auth.is_instructor_or_admin() {
        return Err(AppError::forbidden("Instructor or admin access required"));
    }
    Ok(())
}
