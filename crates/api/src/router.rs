//! The EventHub HTTP surface: routes plus the layers wrapped around them.
//!
//! The binary and the integration tests both go through [`build_app_router`].

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{
    AUTHORIZATION, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{middleware, Router};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::middleware::error_detail::expose_error_detail;
use crate::routes;
use crate::state::AppState;

const MILLIS_PER_HOUR: u64 = 60 * 60 * 1000;

/// Assemble `/health`, `/api/v1` and `/uploads` under the shared layers.
///
/// Outermost first: CORS, request id, tracing, timeout, panic to 500 JSON,
/// hardening headers, body limit, then the development-only error detail.
/// The per-IP limiter on `/api/v1` needs the server started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static("x-request-id");

    let mut app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", api_v1_routes(config))
        // Uploaded photos, read-only.
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir));

    if config.environment.is_development() {
        app = app.layer(middleware::from_fn(expose_error_detail));
    }

    app.layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// `/api/v1` routes, rate limited per client IP when a budget is set.
fn api_v1_routes(config: &ServerConfig) -> Router<AppState> {
    let api = routes::api_routes();

    let Some(per_hour) = config.rate_limit_per_hour else {
        return api;
    };

    let Some(governor) = GovernorConfigBuilder::default()
        .per_millisecond(replenish_interval_ms(per_hour))
        .burst_size(per_hour)
        .finish()
    else {
        tracing::warn!(per_hour, "Invalid rate limit, requests are not limited");
        return api;
    };

    api.layer(GovernorLayer {
        config: Arc::new(governor),
    })
    .layer(middleware::map_response(rate_limited_body))
}

/// One request slot comes back every `hour / per_hour`.
fn replenish_interval_ms(per_hour: u32) -> u64 {
    (MILLIS_PER_HOUR / u64::from(per_hour.max(1))).max(1)
}

/// Replace the limiter's plain-text 429 with the JSON error body, keeping
/// its `retry-after` headers.
async fn rate_limited_body(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }
    let (parts, _) = response.into_parts();
    let mut json = AppError::RateLimited.into_response();
    for (name, value) in parts.headers.iter() {
        if name != CONTENT_TYPE && name != axum::http::header::CONTENT_LENGTH {
            json.headers_mut().insert(name.clone(), value.clone());
        }
    }
    json
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    AppError::InternalError(format!("Handler panicked: {detail}")).into_response()
}

/// Credentialed CORS for the configured frontends. The `jwt` cookie only
/// rides along when `allow_credentials` is on.
///
/// # Panics
///
/// On an origin that is not a valid header value.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let allowed: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .unwrap_or_else(|e| panic!("CORS_ORIGINS entry {origin:?} rejected: {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}
