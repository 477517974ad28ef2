//! User persistence
//!
//! SQL-level CRUD for the users table. The credential store behind login:
//! route handlers go through [`UserService`], never raw SQL.

use crate::auth::{verify_password, Role};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, username, password_hash, full_name, role, is_active, created_at, updated_at";

/// A user row as stored
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new user row
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

fn row_to_user(row: &Row) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        full_name: row.get("full_name"),
        role: row.get("role"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_unique_violation(e: tokio_postgres::Error) -> AppError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        AppError::Conflict("Email or username already registered".to_string())
    } else {
        AppError::from(e)
    }
}

/// User service for database operations
pub struct UserService {
    pool: Pool,
}

impl UserService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Insert a new user row
    pub async fn create(&self, user: NewUser) -> Result<UserRecord, AppError> {
        let client = self.pool.get().await?;

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (id, email, username, password_hash, full_name, role, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {}",
            USER_COLUMNS
        );
        let row = client
            .query_one(
                sql.as_str(),
                &[
                    &Uuid::new_v4(),
                    &user.email,
                    &user.username,
                    &user.password_hash,
                    &user.full_name,
                    &user.role,
                    &user.is_active,
                    &now,
                    &now,
                ],
            )
            .await
            .map_err(map_unique_violation)?;

        Ok(row_to_user(&row))
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AppError> {
        let client = self.pool.get().await?;

        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = client.query_opt(sql.as_str(), &[&id]).await?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let client = self.pool.get().await?;

        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row = client.query_opt(sql.as_str(), &[&email]).await?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Find user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        let client = self.pool.get().await?;

        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row = client.query_opt(sql.as_str(), &[&username]).await?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// List users with pagination
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<UserRecord>, AppError> {
        let client = self.pool.get().await?;

        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at OFFSET $1 LIMIT $2",
            USER_COLUMNS
        );
        let rows = client.query(sql.as_str(), &[&skip, &limit]).await?;

        Ok(rows.iter().map(row_to_user).collect())
    }

    /// Apply a partial update, returning the updated row (None if absent)
    pub async fn update(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<UserRecord>, AppError> {
        let client = self.pool.get().await?;

        let now = Utc::now();
        let sql = format!(
            "UPDATE users SET
                email = COALESCE($2, email),
                username = COALESCE($3, username),
                full_name = COALESCE($4, full_name),
                role = COALESCE($5, role),
                is_active = COALESCE($6, is_active),
                updated_at = $7
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );
        let row = client
            .query_opt(
                sql.as_str(),
                &[
                    &id,
                    &changes.email,
                    &changes.username,
                    &changes.full_name,
                    &changes.role,
                    &changes.is_active,
                    &now,
                ],
            )
            .await
            .map_err(map_unique_violation)?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Delete a user row; false when no row matched
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let client = self.pool.get().await?;

        let deleted = client
            .execute("DELETE FROM users WHERE id = $1", &[&id])
            .await?;

        Ok(deleted > 0)
    }

    /// Look up by username or email and check the password.
    ///
    /// Returns None for unknown identifier and for a wrong password alike;
    /// the login route reports both the same way.
    pub async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, AppError> {
        let user = match self.find_by_username(identifier).await? {
            Some(user) => Some(user),
            None => self.find_by_email(identifier).await?,
        };

        let Some(user) = user else {
            return Ok(None);
        };

        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}
