//! User management route handlers
//!
//! Every handler routes its decision through the access guard; "own record"
//! is decided here by comparing the caller's id to the target id.

use crate::auth::{authorize, hash_password, Identity, Operation, Role};
use crate::db::users::{NewUser, UserChanges, UserRecord};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::MessageResponse;

/// User payload returned to clients; never carries credential material
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    authorize(&identity, Operation::ListUsers)?;

    let users = state
        .users
        .list(page.skip.max(0), page.limit.clamp(1, 500))
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/v1/users/{user_id}
pub async fn get_user(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let operation = if identity.user_id == user_id {
        Operation::ReadOwnProfile
    } else {
        Operation::ReadAnyProfile
    };
    authorize(&identity, operation)?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    authorize(&identity, Operation::CreateUser)?;
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
            role: req.role,
            is_active: req.is_active,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// PUT /api/v1/users/{user_id}
///
/// Self-updates are open to every role but may not touch the role field;
/// updating someone else (role included) is admin territory.
pub async fn update_user(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if state.users.find_by_id(user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let mut changes = UserChanges {
        email: req.email,
        username: req.username,
        full_name: req.full_name,
        role: req.role,
        is_active: req.is_active,
    };

    if identity.user_id == user_id {
        authorize(&identity, Operation::UpdateOwnProfile)?;
        // A role field in a self-update is dropped unless the caller may
        // change roles in general.
        if changes.role.is_some() && authorize(&identity, Operation::ChangeRole).is_err() {
            changes.role = None;
        }
    } else {
        authorize(&identity, Operation::UpdateAnyUser)?;
        if changes.role.is_some() {
            authorize(&identity, Operation::ChangeRole)?;
        }
    }

    let user = state
        .users
        .update(user_id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/v1/users/{user_id}
pub async fn delete_user(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    authorize(&identity, Operation::DeleteUser)?;

    if identity.user_id == user_id {
        return Err(AppError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    if !state.users.delete(user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
