//! Handlers for the signed-in user's own profile, plus the user request
//! types shared with the admin CRUD routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use eventhub_db::models::user::UserResponse;
use eventhub_db::repositories::UserRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::{lenient, Payload};
use crate::handlers::factory::{self, DeleteMode};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Fields a user may change about themselves through `/updateMe`.
const SELF_EDITABLE_FIELDS: &[&str] = &["name", "email"];

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body for signup and admin user creation.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Please tell us your name!"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    /// Ignored on signup; admins may set it.
    pub role: Option<String>,
}

/// Body for admin user updates. Passwords are never changed here.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Please tell us your name!"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /users/me
pub async fn get_me(user: AuthUser) -> Json<DataResponse<UserResponse>> {
    Json(DataResponse::new(user.user.into()))
}

/// PATCH /users/updateMe -- name, email and photo only.
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Payload,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    if payload.contains("password") || payload.contains("password_confirm") {
        return Err(AppError::BadRequest(
            "This route is not for password updates. Please use /updateMyPassword.".into(),
        ));
    }

    let updated =
        factory::update_one::<UserRepo>(&state, user.user_id, payload, Some(SELF_EDITABLE_FIELDS))
            .await?;
    Ok(Json(DataResponse::new(updated)))
}

/// DELETE /users/deleteMe -- soft delete of the caller.
pub async fn delete_me(user: AuthUser, State(state): State<AppState>) -> AppResult<StatusCode> {
    factory::delete_one::<UserRepo>(&state, user.user_id, DeleteMode::Soft).await?;
    Ok(StatusCode::NO_CONTENT)
}
