//! Request DTOs.

use serde::{Deserialize, Serialize};

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Enrollment request body.
///
/// The priority is any integer; the four named tiers are 1 (low),
/// 5 (normal), 10 (high), and 15 (critical). Unrecognized values are
/// accepted as-is and used purely as an ordering key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrollRequest {
    /// Optional job priority; defaults to normal (5).
    pub priority: Option<i32>,
}
