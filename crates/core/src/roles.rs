//! Well-known role name constants.
//!
//! These must match the `ck_users_role` constraint in
//! `20260301000002_create_users.sql`.

use crate::error::CoreError;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Every role a user row may carry.
pub const ALL_ROLES: &[&str] = &[ROLE_USER, ROLE_ADMIN];

/// Reject role names outside [`ALL_ROLES`].
pub fn validate_role(role: &str) -> Result<(), CoreError> {
    if ALL_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid role '{role}'. Expected one of: {}",
            ALL_ROLES.join(", ")
        )))
    }
}
