//! Application state management
//!
//! Contains shared state accessible across all handlers. The signing keys
//! are loaded once at startup and never mutated afterwards.

use crate::auth::TokenKeys;
use crate::config::SlackConfig;
use crate::db::users::UserService;
use deadpool_postgres::Pool;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Database connection pool
    pub db_pool: Pool,

    /// User service for database operations
    pub users: UserService,

    /// Token signing/verification material
    pub token_keys: TokenKeys,

    /// Slack integration settings
    pub slack: SlackConfig,
}

impl AppState {
    pub fn new(pool: Pool, token_keys: TokenKeys, slack: SlackConfig) -> Self {
        Self {
            users: UserService::new(pool.clone()),
            db_pool: pool,
            token_keys,
            slack,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
