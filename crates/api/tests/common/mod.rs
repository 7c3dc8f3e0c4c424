//! Shared test harness: builds the full application router (same middleware
//! stack as production) and provides request/auth helpers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use uuid::Uuid;

use leadbase_api::auth::jwt::{generate_access_token, JwtConfig};
use leadbase_api::config::ServerConfig;
use leadbase_api::state::AppState;
use leadbase_api::routes;
use leadbase_core::rate_limit::RateLimiter;
use leadbase_db::models::buyer::{Buyer, CreateBuyer};
use leadbase_db::repositories::BuyerRepo;

/// Build a test `ServerConfig` with safe defaults and the production rate
/// limits (5 creates / 10 updates per 10s) so limiter behaviour is exercised
/// as-is.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: test_jwt_config(),
        create_rate_limit: 5,
        update_rate_limit: 10,
        rate_limit_window_ms: 10_000,
        conflict_tolerance_ms: 1_000,
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        access_token_expiry_mins: 15,
    }
}

/// Mint a Bearer token for an agent-role user.
pub fn agent_token(user_id: Uuid) -> String {
    generate_access_token(user_id, "agent", &test_jwt_config())
        .expect("token generation should succeed")
}

/// Mint a Bearer token for an admin-role user.
pub fn admin_token(user_id: Uuid) -> String {
    generate_access_token(user_id, "admin", &test_jwt_config())
        .expect("token generation should succeed")
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses. Clone the returned router between
/// requests -- clones share the same state, including the rate limiter.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();

    let state = AppState {
        pool,
        config: Arc::new(config),
        rate_limiter: Arc::new(RateLimiter::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    };

    app.oneshot(request).await.expect("request should not fail")
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn get_unauthed(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_json_unauthed(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// Collect the response body as a UTF-8 string (for CSV downloads).
pub async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

// ---------------------------------------------------------------------------
// Payload / seeding helpers
// ---------------------------------------------------------------------------

/// A minimal valid create payload (Plot: no bhk required).
pub fn buyer_payload(full_name: &str, phone: &str) -> serde_json::Value {
    serde_json::json!({
        "full_name": full_name,
        "phone": phone,
        "city": "Mohali",
        "property_type": "Plot",
        "purpose": "Buy",
        "timeline": "Exploring",
        "source": "Website",
    })
}

fn create_input(full_name: &str, phone: &str) -> CreateBuyer {
    serde_json::from_value(buyer_payload(full_name, phone))
        .expect("payload should deserialize into CreateBuyer")
}

/// Insert a buyer directly through the repository, bypassing the HTTP-level
/// rate limiter. Use for seeding list/export fixtures.
pub async fn seed_buyer(pool: &PgPool, owner: Uuid, full_name: &str, phone: &str) -> Buyer {
    BuyerRepo::create(pool, owner, &create_input(full_name, phone))
        .await
        .expect("seed insert should succeed")
}
