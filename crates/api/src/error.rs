use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eventhub_core::error::CoreError;
use jsonwebtoken::errors::ErrorKind;
use serde_json::json;

use crate::middleware::error_detail::ErrorDetail;

/// Message shown to clients for every unexpected failure.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong!";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses:
///
/// ```text
/// { "status": "fail" | "error", "code": "...", "message": "..." }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `eventhub_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A JWT that failed signature or expiry verification.
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// A path identifier that is not a valid record id.
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// A missing record described by a free-form message.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// The client exhausted its request budget.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Status, machine-readable code and client message for this error.
    pub fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::BAD_REQUEST, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Auth tokens ---
            AppError::Token(err) => match err.kind() {
                ErrorKind::ExpiredSignature => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_EXPIRED",
                    "Your token has expired. Please log in again!".to_string(),
                ),
                _ => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_TOKEN",
                    "Invalid token. Please log in again!".to_string(),
                ),
            },

            // --- HTTP-specific errors ---
            AppError::InvalidId(raw) => (
                StatusCode::BAD_REQUEST,
                "INVALID_ID",
                format!("Invalid id: {raw}"),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many requests from this IP, please try again in an hour!".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();
        let status_label = status_label(status);

        let body = json!({
            "status": status_label,
            "code": code,
            "message": message,
        });

        let mut response = (status, axum::Json(body)).into_response();
        response.extensions_mut().insert(ErrorDetail {
            status_label,
            code,
            raw_message: self.to_string(),
            debug: format!("{self:?}"),
        });
        response
    }
}

/// `"fail"` for client errors, `"error"` for server errors.
pub fn status_label(status: StatusCode) -> &'static str {
    if status.is_client_error() {
        "fail"
    } else {
        "error"
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        GENERIC_ERROR_MESSAGE.to_string(),
    )
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations (23505) map to 400 naming the duplicated value.
/// - Check and not-null violations (23514, 23502) map to 400.
/// - Foreign-key violations (23503) map to 400.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => {
                let detail = db_err
                    .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                    .and_then(|pg| pg.detail());
                let value = detail
                    .and_then(duplicate_value)
                    .or(db_err.constraint())
                    .unwrap_or("unknown");
                (
                    StatusCode::BAD_REQUEST,
                    "DUPLICATE_VALUE",
                    format!("Duplicate field value: '{value}'. Please use another value."),
                )
            }
            Some("23514") | Some("23502") => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                format!("Invalid input: {}", db_err.message()),
            ),
            Some("23503") => (
                StatusCode::BAD_REQUEST,
                "INVALID_REFERENCE",
                "Referenced record is missing or still in use".to_string(),
            ),
            _ => {
                tracing::error!(error = %db_err, "Database error");
                internal()
            }
        },
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

/// Extract the offending value from a Postgres unique-violation detail:
/// `Key (email)=(a@b.c) already exists.` yields `a@b.c`.
fn duplicate_value(detail: &str) -> Option<&str> {
    let (_, rest) = detail.split_once(")=(")?;
    rest.rsplit_once(") already exists").map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_value_is_extracted_from_detail() {
        assert_eq!(
            duplicate_value("Key (email)=(alice@example.com) already exists."),
            Some("alice@example.com")
        );
        assert_eq!(
            duplicate_value("Key (user_id, event_id)=(1, 2) already exists."),
            Some("1, 2")
        );
        assert_eq!(duplicate_value("something else"), None);
    }

    #[test]
    fn client_errors_are_fail_server_errors_are_error() {
        assert_eq!(status_label(StatusCode::BAD_REQUEST), "fail");
        assert_eq!(status_label(StatusCode::NOT_FOUND), "fail");
        assert_eq!(status_label(StatusCode::INTERNAL_SERVER_ERROR), "error");
    }

    #[test]
    fn conflicts_are_bad_requests() {
        let (status, code, message) =
            AppError::Core(CoreError::Conflict("Event is fully booked".into())).classify();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "CONFLICT");
        assert_eq!(message, "Event is fully booked");
    }

    #[test]
    fn invalid_id_names_the_value() {
        let (status, _, message) = AppError::InvalidId("abc".into()).classify();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Invalid id: abc");
    }

    #[test]
    fn internal_errors_hide_details() {
        let (status, _, message) = AppError::InternalError("disk on fire".into()).classify();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn missing_row_is_not_found() {
        let (status, _, _) = AppError::Database(sqlx::Error::RowNotFound).classify();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn token_errors_are_tailored() {
        let expired = jsonwebtoken::errors::Error::from(ErrorKind::ExpiredSignature);
        let (status, _, message) = AppError::Token(expired).classify();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, "Your token has expired. Please log in again!");

        let invalid = jsonwebtoken::errors::Error::from(ErrorKind::InvalidSignature);
        let (_, _, message) = AppError::Token(invalid).classify();
        assert_eq!(message, "Invalid token. Please log in again!");
    }
}
