//! Authentication handlers.

use axum::extract::State;
use axum::Json;

use learnhub_core::error::AppError;
use learnhub_entity::user::User;

use crate::dto::request::LoginRequest;
use crate::dto::response::{ApiResponse, LoginResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role.to_string(),
        created_at: user.created_at,
    }
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let user = state
        .user_repo
        .find_by_username(&req.username)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid username or password"))?;

    let valid = state
        .password_hasher
        .verify(&req.password, &user.password_hash)?;
    if !valid {
        return Err(AppError::unauthorized("Invalid username or password").into());
    }

    let (access_token, expires_at) = state.jwt_encoder.encode(&user)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(ApiResponse::ok(LoginResponse {
        access_token,
        expires_at,
        user: user_response(user),
    })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state
        .user_repo
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(ApiResponse::ok(user_response(user))))
}
