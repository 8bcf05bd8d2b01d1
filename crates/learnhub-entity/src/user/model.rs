//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;

/// A platform user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Login name, unique across the platform.
    pub username: String,
    /// Contact email.
    pub email: Option<String>,
    /// Argon2 password hash. Never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// The user's platform role.
    pub role: UserRole,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: Option<String>,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Platform role.
    pub role: UserRole,
}
