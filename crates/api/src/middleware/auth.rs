//! JWT-based authentication extractor for Axum handlers.
//!
//! Resolution runs in order and stops at the first failure:
//!
//! 1. token from `Authorization: Bearer <token>` or the `jwt` cookie
//! 2. signature and expiry check
//! 3. subject resolved to an active user
//! 4. token issued no earlier than the last password change

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use eventhub_core::error::CoreError;
use eventhub_core::types::DbId;
use eventhub_db::models::user::User;
use eventhub_db::repositories::UserRepo;

use crate::auth::cookie::TOKEN_COOKIE;
use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

pub const NOT_LOGGED_IN: &str = "Not logged in";
pub const USER_GONE: &str = "User no longer exists";
pub const PASSWORD_CHANGED: &str = "Password changed recently";

/// Authenticated user resolved from a JWT.
///
/// Use this as an extractor parameter in any handler that requires authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name (`"user"` or `"admin"`).
    pub role: String,
    /// The full user row as loaded for this request.
    pub user: User,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized(NOT_LOGGED_IN.into())))?;

        let claims = validate_token(&token, &state.config.jwt)?;

        let user = UserRepo::find_by_id(&state.pool, claims.sub)
            .await?
            .filter(|u| u.active)
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized(USER_GONE.into())))?;

        if user.changed_password_after(claims.iat) {
            return Err(AppError::Core(CoreError::Unauthorized(
                PASSWORD_CHANGED.into(),
            )));
        }

        Ok(AuthUser {
            user_id: user.id,
            role: user.role.clone(),
            user,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn cookie_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|t| !t.is_empty())
}
