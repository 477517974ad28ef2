//! Role-based access control
//!
//! A flat minimum-role table over a closed set of operations. Authorization
//! is an ordering comparison against that table: the caller's role must be
//! at least the operation's minimum. Anything not enumerated here is denied
//! by construction.

use crate::auth::{Identity, Role};
use crate::error::AppError;

/// The guarded operations of the user-management surface.
///
/// Own/Any variants are distinct entries; the route layer decides which one
/// applies by comparing the caller's id to the target record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReadOwnProfile,
    UpdateOwnProfile,
    ReadAnyProfile,
    ListUsers,
    CreateUser,
    UpdateAnyUser,
    ChangeRole,
    DeleteUser,
}

impl Operation {
    /// Minimum role required for each operation.
    pub const fn required_role(self) -> Role {
        match self {
            Operation::ReadOwnProfile | Operation::UpdateOwnProfile => Role::Employee,
            Operation::ReadAnyProfile | Operation::ListUsers => Role::Manager,
            Operation::CreateUser
            | Operation::UpdateAnyUser
            | Operation::ChangeRole
            | Operation::DeleteUser => Role::Admin,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::ReadOwnProfile => "read_own_profile",
            Operation::UpdateOwnProfile => "update_own_profile",
            Operation::ReadAnyProfile => "read_any_profile",
            Operation::ListUsers => "list_users",
            Operation::CreateUser => "create_user",
            Operation::UpdateAnyUser => "update_any_user",
            Operation::ChangeRole => "change_role",
            Operation::DeleteUser => "delete_user",
        };
        write!(f, "{}", name)
    }
}

/// Decide whether the caller may perform an operation.
///
/// Pure function of (role, operation); no state, safe under arbitrary
/// concurrent invocation.
pub fn authorize(identity: &Identity, operation: Operation) -> Result<(), AppError> {
    let required = operation.required_role();
    if identity.role >= required {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(format!(
            "{} requires the {} role",
            operation, required
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    fn allowed(role: Role, op: Operation) -> bool {
        authorize(&identity(role), op).is_ok()
    }

    #[test]
    fn self_service_is_allowed_at_every_role() {
        for role in [Role::Employee, Role::Manager, Role::Admin] {
            assert!(allowed(role, Operation::ReadOwnProfile));
            assert!(allowed(role, Operation::UpdateOwnProfile));
        }
    }

    #[test]
    fn employee_cannot_list_or_read_other_users() {
        assert!(!allowed(Role::Employee, Operation::ListUsers));
        assert!(!allowed(Role::Employee, Operation::ReadAnyProfile));
    }

    #[test]
    fn manager_can_read_but_not_administer() {
        assert!(allowed(Role::Manager, Operation::ListUsers));
        assert!(allowed(Role::Manager, Operation::ReadAnyProfile));
        assert!(!allowed(Role::Manager, Operation::CreateUser));
        assert!(!allowed(Role::Manager, Operation::UpdateAnyUser));
        assert!(!allowed(Role::Manager, Operation::ChangeRole));
        assert!(!allowed(Role::Manager, Operation::DeleteUser));
    }

    #[test]
    fn role_changes_require_admin() {
        assert!(!allowed(Role::Employee, Operation::ChangeRole));
        assert!(!allowed(Role::Manager, Operation::ChangeRole));
        assert!(allowed(Role::Admin, Operation::ChangeRole));
    }

    #[test]
    fn delete_user_denied_for_employee_allowed_for_admin() {
        assert!(!allowed(Role::Employee, Operation::DeleteUser));
        assert!(allowed(Role::Admin, Operation::DeleteUser));
    }

    #[test]
    fn admin_passes_the_entire_table() {
        for op in [
            Operation::ReadOwnProfile,
            Operation::UpdateOwnProfile,
            Operation::ReadAnyProfile,
            Operation::ListUsers,
            Operation::CreateUser,
            Operation::UpdateAnyUser,
            Operation::ChangeRole,
            Operation::DeleteUser,
        ] {
            assert!(allowed(Role::Admin, op));
        }
    }

    #[test]
    fn denial_is_permission_denied_not_unauthenticated() {
        let err = authorize(&identity(Role::Employee), Operation::DeleteUser).unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }
}
