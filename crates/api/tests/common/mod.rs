#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use eventhub_api::auth::jwt::{generate_access_token, JwtConfig};
use eventhub_api::auth::password::hash_password;
use eventhub_api::config::{AppEnvironment, ServerConfig};
use eventhub_api::router::build_app_router;
use eventhub_api::state::AppState;
use eventhub_db::models::user::{CreateUser, User};
use eventhub_db::repositories::UserRepo;

pub const TEST_PASSWORD: &str = "test-password-123";

/// Build a test `ServerConfig` with safe defaults.
///
/// Rate limiting is off: `oneshot` requests carry no peer address.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        environment: AppEnvironment::Production,
        uploads_dir: std::env::temp_dir().join("eventhub-test-uploads"),
        base_url: "http://localhost:3000".to_string(),
        body_limit_bytes: 3 * 1024 * 1024,
        rate_limit_per_hour: None,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            expiry_days: 90,
            cookie_expiry_days: 90,
        },
    }
}

/// Build the full application router, exactly as `main.rs` does.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_with_config(pool, test_config())
}

/// Same as [`build_test_app`] with photos stored under `uploads_dir`.
pub fn build_test_app_with_uploads(pool: PgPool, uploads_dir: &Path) -> Router {
    let config = ServerConfig {
        uploads_dir: PathBuf::from(uploads_dir),
        ..test_config()
    };
    build_app_with_config(pool, config)
}

pub fn build_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] directly through the repository.
pub async fn create_user(pool: &PgPool, name: &str, role: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            role: role.to_string(),
            photo: None,
        },
    )
    .await
    .expect("user creation should succeed")
}

/// A valid token for `user_id`, signed with the test secret.
pub fn token_for(user_id: i64) -> String {
    generate_access_token(user_id, &test_config().jwt).expect("token generation should succeed")
}

/// An event body accepted by `POST /api/v1/events`.
pub fn event_body(title: &str, max_participants: i32) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "Rooftop concert",
        "date": "2030-06-01T18:00:00Z",
        "max_participants": max_participants,
        "location": { "address": "Main Street 1", "city": "Berlin", "country": "DE" },
        "price": 15.0
    })
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should not fail")
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
}

fn with_json(
    builder: axum::http::request::Builder,
    body: serde_json::Value,
) -> Request<Body> {
    builder
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, request(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::GET, uri, Some(token)).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, with_json(request(Method::POST, uri, None), body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, with_json(request(Method::POST, uri, Some(token)), body)).await
}

pub async fn patch_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, with_json(request(Method::PATCH, uri, None), body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, with_json(request(Method::PATCH, uri, Some(token)), body)).await
}

pub async fn patch_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::PATCH, uri, Some(token)).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::DELETE, uri, Some(token)).body(Body::empty()).unwrap(),
    )
    .await
}

pub const MULTIPART_BOUNDARY: &str = "eventhub-test-boundary";

/// Multipart body with text fields and an optional `photo` file part.
pub fn multipart_body(fields: &[(&str, &str)], photo: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = photo {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn send_multipart_auth(
    app: Router,
    method: Method,
    uri: &str,
    body: Vec<u8>,
    token: &str,
) -> Response {
    let request = request(method, uri, Some(token))
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}
