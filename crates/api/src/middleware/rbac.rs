//! Role gates layered on top of [`AuthUser`].
//!
//! Admins manage users and events; plain users are the only ones who RSVP.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use eventhub_core::error::CoreError;
use eventhub_core::roles::{ROLE_ADMIN, ROLE_USER};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

pub const FORBIDDEN_MESSAGE: &str = "You don't have the permission to perform this action.";

/// 403 unless the caller holds one of `allowed`.
pub fn ensure_role(user: &AuthUser, allowed: &[&str]) -> Result<(), AppError> {
    if allowed.iter().any(|role| *role == user.role) {
        return Ok(());
    }
    Err(CoreError::Forbidden(FORBIDDEN_MESSAGE.into()).into())
}

macro_rules! role_gate {
    ($(#[$doc:meta])* $name:ident => $($role:expr),+) => {
        $(#[$doc])*
        pub struct $name(pub AuthUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let caller = AuthUser::from_request_parts(parts, state).await?;
                ensure_role(&caller, &[$($role),+])?;
                Ok(Self(caller))
            }
        }
    };
}

role_gate!(
    /// Admin-only routes: user management and event writes.
    RequireAdmin => ROLE_ADMIN
);

role_gate!(
    /// Attend/unattend. Admins are refused as well.
    RequireUser => ROLE_USER
);
