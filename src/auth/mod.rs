//! Authentication and authorization module
//!
//! Provides JWT-based authentication and role-based access control.

mod guard;
mod middleware;
mod password;
mod token;

pub use guard::{authorize, Operation};
pub use middleware::auth_middleware;
pub use password::{hash_password, verify_password};
pub use token::{AuthError, Claims, TokenKeys, TokenPair, TokenType};

use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User roles, ordered by privilege: each tier carries all permissions of
/// the tiers below it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSql, FromSql,
)]
#[serde(rename_all = "lowercase")]
#[postgres(name = "user_role")]
pub enum Role {
    /// Can read and update their own profile
    #[postgres(name = "employee")]
    Employee,
    /// Employee permissions, plus read access to every user
    #[postgres(name = "manager")]
    Manager,
    /// Manager permissions, plus user administration
    #[postgres(name = "admin")]
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::Employee
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Employee => write!(f, "employee"),
            Role::Manager => write!(f, "manager"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// The verified caller of a request, reconstructed from token claims.
///
/// The role is whatever was embedded at issuance time. It is not re-read
/// from the credential store, so a role change only becomes visible once
/// the user's current token expires and a new pair is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn roles_are_strictly_ordered() {
        assert!(Role::Employee < Role::Manager);
        assert!(Role::Manager < Role::Admin);
        assert!(Role::Admin >= Role::Employee);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }

    #[test]
    fn default_role_is_employee() {
        assert_eq!(Role::default(), Role::Employee);
    }
}
