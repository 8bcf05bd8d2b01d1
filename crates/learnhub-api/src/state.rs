//! Application state shared across all handlers.

use std::sync::Arc;

use sqlx::PgPool;

use learnhub_auth::jwt::{JwtDecoder, JwtEncoder};
use learnhub_auth::password::PasswordHasher;
use learnhub_core::config::AppConfig;
use learnhub_database::repositories::user::UserRepository;
use learnhub_service::enrollment::service::EnrollmentService;
use learnhub_service::enrollment::status::QueueStatusService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool (used directly by health checks).
    pub db_pool: PgPool,

    /// JWT token encoder.
    pub jwt_encoder: Arc<JwtEncoder>,
    /// JWT token decoder and validator.
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Password hasher (Argon2).
    pub password_hasher: Arc<PasswordHasher>,

    /// User repository.
    pub user_repo: Arc<UserRepository>,

    /// Enrollment admission service.
    pub enrollment_service: Arc<EnrollmentService>,
    /// Job status / stats / cancellation service.
    pub queue_status_service: Arc<QueueStatusService>,
}
