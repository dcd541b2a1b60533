//! Liveness check and the cross-cutting HTTP layers every route shares.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{body_json, get};
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_reports_database_reachable(pool: PgPool) {
    let json = body_json(get(common::build_test_app(pool), "/health").await).await;

    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn paths_outside_the_api_are_404(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v2/events").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn caller_supplied_request_id_is_echoed(pool: PgPool) {
    let request = Request::get("/health")
        .header("x-request-id", "evt-trace-0001")
        .body(Body::empty())
        .unwrap();
    let response = common::build_test_app(pool).oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "evt-trace-0001");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn generated_request_id_is_a_uuid(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/health").await;

    let id = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok(), "not a uuid: {id}");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn public_event_listing_carries_hardening_headers(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/events").await;

    assert_eq!(response.status(), StatusCode::OK);
    let h = response.headers();
    assert_eq!(h["x-content-type-options"], "nosniff");
    assert_eq!(h["x-frame-options"], "DENY");
    assert_eq!(h["referrer-policy"], "no-referrer");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn frontend_may_preflight_rsvp_patch(pool: PgPool) {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/events/1/attend")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(Body::empty())
        .unwrap();

    let response = common::build_test_app(pool).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let h = response.headers();
    assert_eq!(h[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
    let methods = h[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    assert!(methods.contains("PATCH"), "got {methods}");
}
