//! Development-only rewrite of error bodies.
//!
//! [`AppError`](crate::error::AppError) attaches an [`ErrorDetail`] to every
//! error response. In production the extension is ignored; in development
//! [`expose_error_detail`] replaces the sanitized message with the raw error
//! text and adds an `error` field with the debug rendering.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Unsanitized description of an error response.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub status_label: &'static str,
    pub code: &'static str,
    pub raw_message: String,
    pub debug: String,
}

pub async fn expose_error_detail(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    let body = axum::Json(json!({
        "status": detail.status_label,
        "code": detail.code,
        "message": detail.raw_message,
        "error": detail.debug,
    }));
    (parts, body).into_response()
}
