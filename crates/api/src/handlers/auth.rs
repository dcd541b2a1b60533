//! Handlers for signup, login, logout and the password flows.

use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use eventhub_core::error::CoreError;
use eventhub_core::types::DbId;
use eventhub_core::validation::{normalize_email, validate_new_password};
use eventhub_db::models::user::UserResponse;
use eventhub_db::repositories::UserRepo;
use serde::Deserialize;
use validator::Validate;

use crate::auth::cookie::{logged_out_cookie, token_cookie};
use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::reset::{generate_reset_token, hash_reset_token, reset_token_expiry};
use crate::error::{AppError, AppResult};
use crate::extract::{Payload, ValidatedJson};
use crate::handlers::factory;
use crate::middleware::auth::AuthUser;
use crate::response::{MessageResponse, TokenResponse};
use crate::state::AppState;

const INCORRECT_CREDENTIALS: &str = "Incorrect email or password";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /users/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for `POST /users/forgotPassword`.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

/// Request body for `PATCH /users/resetPassword/{token}`.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub password_confirm: String,
}

/// Request body for `PATCH /users/updateMyPassword`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    pub password_current: String,
    pub password: String,
    pub password_confirm: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Issue a token for `user` and return it in the body and the `jwt` cookie.
fn send_token(state: &AppState, user: UserResponse, status: StatusCode) -> AppResult<Response> {
    let token = generate_access_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;
    let cookie = token_cookie(
        &token,
        state.config.jwt.cookie_expiry_days,
        state.config.environment,
    )?;

    Ok((
        status,
        [(SET_COOKIE, cookie)],
        Json(TokenResponse::new(token, user)),
    )
        .into_response())
}

fn hash(password: &str) -> AppResult<String> {
    hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.into()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /users/signup
///
/// Always creates a plain `user`; a `role` in the body is ignored.
pub async fn signup(State(state): State<AppState>, mut payload: Payload) -> AppResult<Response> {
    payload.fields.remove("role");
    let user = factory::create_one::<UserRepo>(&state, payload, None).await?;
    tracing::info!(user_id = user.id, "User signed up");
    send_token(&state, user, StatusCode::CREATED)
}

/// POST /users/login
///
/// Unknown email, wrong password and deactivated accounts all get the same
/// 401 so the response does not reveal which emails exist.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> AppResult<Response> {
    let (Some(email), Some(password)) = (input.email, input.password) else {
        return Err(AppError::BadRequest(
            "Please provide email and password!".into(),
        ));
    };

    let user = UserRepo::find_by_email(&state.pool, &normalize_email(&email))
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| unauthorized(INCORRECT_CREDENTIALS))?;

    let valid = verify_password(&password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?;
    if !valid {
        return Err(unauthorized(INCORRECT_CREDENTIALS));
    }

    tracing::info!(user_id = user.id, "User logged in");
    send_token(&state, user.into(), StatusCode::OK)
}

/// GET /users/logout -- overwrite the cookie with a short-lived dummy.
pub async fn logout(State(state): State<AppState>) -> AppResult<Response> {
    let cookie = logged_out_cookie(state.config.environment)?;
    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(MessageResponse::new("Logged out")),
    )
        .into_response())
}

/// POST /users/forgotPassword
///
/// Issues a single-use reset token valid for ten minutes. The reset URL is
/// written to the log; there is no mail delivery.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = UserRepo::find_by_email(&state.pool, &normalize_email(&input.email))
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| AppError::NotFound("There is no user with that email address.".into()))?;

    let (token, token_hash) = generate_reset_token();
    UserRepo::set_reset_token(&state.pool, user.id, &token_hash, reset_token_expiry()).await?;

    let reset_url = format!(
        "{}/api/v1/users/resetPassword/{token}",
        state.config.base_url
    );
    tracing::info!(user_id = user.id, %reset_url, "Password reset requested");

    Ok(Json(MessageResponse::new(
        "Password reset token issued. It is valid for 10 minutes.",
    )))
}

/// PATCH /users/resetPassword/{token}
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ValidatedJson(input): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Response> {
    validate_new_password(&input.password, &input.password_confirm)?;
    let password_hash = hash(&input.password)?;

    let user = UserRepo::consume_reset_token(&state.pool, &hash_reset_token(&token), &password_hash)
        .await?
        .ok_or_else(|| AppError::BadRequest("Token is invalid or has expired".into()))?;

    tracing::info!(user_id = user.id, "Password reset completed");
    send_token(&state, user.into(), StatusCode::OK)
}

/// PATCH /users/updateMyPassword
pub async fn update_my_password(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdatePasswordRequest>,
) -> AppResult<Response> {
    let current_ok = verify_password(&input.password_current, &auth.user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?;
    if !current_ok {
        return Err(unauthorized("Your current password is wrong."));
    }

    validate_new_password(&input.password, &input.password_confirm)?;
    let password_hash = hash(&input.password)?;

    let user = UserRepo::update_password(&state.pool, auth.user_id, &password_hash)
        .await?
        .ok_or_else(|| user_vanished(auth.user_id))?;

    tracing::info!(user_id = user.id, "Password updated");
    send_token(&state, user.into(), StatusCode::OK)
}

fn user_vanished(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "User", id })
}
