//! Integration tests for authentication failures on the API surface.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::{Request, StatusCode};
use axum::body::Body;
use common::{body_json, buyer_payload, get_unauthed, post_json_unauthed};
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "../db/migrations")]
async fn request_without_token_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get_unauthed(app, "/api/v1/buyers").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_without_token_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json_unauthed(
        app,
        "/api/v1/buyers",
        buyer_payload("Jane Doe", "9998887776"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn non_bearer_authorization_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let request = Request::builder()
        .uri("/api/v1/buyers")
        .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn garbage_token_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let request = Request::builder()
        .uri("/api/v1/buyers")
        .header(AUTHORIZATION, "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn health_does_not_require_auth(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get_unauthed(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}
