//! Authentication route handlers
//!
//! Login, registration, token refresh, and current-user endpoints.

use crate::auth::{hash_password, Identity, Role, TokenPair, TokenType};
use crate::db::users::NewUser;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use validator::Validate;

use super::users::UserResponse;
use super::MessageResponse;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/v1/auth/login
///
/// Authenticate with username/email and password, receive a token pair.
/// Unknown identifier and wrong password produce the same response.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let user = state
        .users
        .authenticate(&req.username, &req.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("incorrect username or password".to_string()))?;

    if !user.is_active {
        return Err(AppError::BadRequest("Inactive user".to_string()));
    }

    let tokens = state.token_keys.issue(user.id, user.role)?;
    Ok(Json(tokens))
}

/// POST /api/v1/auth/register
///
/// Self-service registration. New accounts always start as Employee;
/// only an admin can raise a role afterwards.
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if state.users.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::Conflict("Username already registered".to_string()));
    }

    let user = state
        .users
        .create(NewUser {
            email: req.email,
            username: req.username,
            password_hash: hash_password(&req.password)?,
            full_name: req.full_name,
            role: Role::Employee,
            is_active: true,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new pair. Explicit, caller-driven: an
/// expired access token is never refreshed implicitly. The user row is
/// re-read so the new pair carries the current role.
pub async fn refresh(
    State(state): State<SharedState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let identity = state
        .token_keys
        .verify(&req.refresh_token, TokenType::Refresh)?;

    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| {
            AppError::Unauthorized("refresh token for unknown or inactive user".to_string())
        })?;

    let tokens = state.token_keys.issue(user.id, user.role)?;
    Ok(Json(tokens))
}

/// GET /api/v1/auth/me
///
/// Current user info for the verified caller.
pub async fn me(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user no longer exists".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// POST /api/v1/auth/logout
///
/// Tokens are stateless; there is nothing to invalidate server-side.
/// Clients discard their pair.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Successfully logged out".to_string(),
    })
}
