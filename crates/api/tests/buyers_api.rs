//! HTTP-level integration tests for the buyer CRUD endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! without an actual TCP listener.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, agent_token, body_json, buyer_payload, delete, get, post_json, put_json,
    seed_buyer,
};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn create_buyer_returns_201_and_roundtrips(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = agent_token(Uuid::new_v4());

    let mut payload = buyer_payload("Jane Doe", "9998887776");
    payload["email"] = serde_json::json!("jane@example.com");
    payload["budget_min"] = serde_json::json!(1_000_000);
    payload["budget_max"] = serde_json::json!(2_000_000);
    payload["tags"] = serde_json::json!(["hot", "riverside"]);

    let response = post_json(app.clone(), "/api/v1/buyers", &token, payload).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["full_name"], "Jane Doe");
    assert_eq!(created["status"], "New");
    assert!(created["id"].is_string());
    assert!(created["created_at"].is_string());

    // Fetch it back: same field values, plus empty history.
    let id = created["id"].as_str().unwrap();
    let response = get(app, &format!("/api/v1/buyers/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let detail = body_json(response).await;
    assert_eq!(detail["buyer"]["full_name"], "Jane Doe");
    assert_eq!(detail["buyer"]["email"], "jane@example.com");
    assert_eq!(detail["buyer"]["phone"], "9998887776");
    assert_eq!(detail["buyer"]["budget_min"], 1_000_000);
    assert_eq!(detail["buyer"]["budget_max"], 2_000_000);
    assert_eq!(detail["buyer"]["tags"], serde_json::json!(["hot", "riverside"]));
    assert_eq!(detail["history"], serde_json::json!([]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_villa_without_bhk_fails_on_bhk(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = agent_token(Uuid::new_v4());

    // The same payload is valid for a Plot...
    let response = post_json(
        app.clone(),
        "/api/v1/buyers",
        &token,
        buyer_payload("Jane Doe", "9998887776"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // ...but a Villa requires bhk.
    let mut payload = buyer_payload("Jane Doe", "9998887776");
    payload["property_type"] = serde_json::json!("Villa");
    let response = post_json(app, "/api/v1/buyers", &token, payload).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["issues"][0]["field"], "bhk");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_with_invalid_payload_reports_each_field(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = agent_token(Uuid::new_v4());

    let mut payload = buyer_payload("J", "12-34");
    payload["budget_min"] = serde_json::json!(500);
    payload["budget_max"] = serde_json::json!(100);

    let response = post_json(app, "/api/v1/buyers", &token, payload).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    let fields: Vec<&str> = json["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"full_name"));
    assert!(fields.contains(&"phone"));
    assert!(fields.contains(&"budget_max"));
}

// ---------------------------------------------------------------------------
// Fetch / ownership
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn get_nonexistent_buyer_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = agent_token(Uuid::new_v4());

    let response = get(app, &format!("/api/v1/buyers/{}", Uuid::new_v4()), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn buyers_are_scoped_to_their_owner(pool: PgPool) {
    let owner = Uuid::new_v4();
    let buyer = seed_buyer(&pool, owner, "Jane Doe", "9998887776").await;
    let app = common::build_test_app(pool);
    let uri = format!("/api/v1/buyers/{}", buyer.id);

    // Another agent cannot see it.
    let other = agent_token(Uuid::new_v4());
    let response = get(app.clone(), &uri, &other).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The owner can.
    let response = get(app.clone(), &uri, &agent_token(owner)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // An admin can, regardless of owner.
    let response = get(app, &uri, &admin_token(Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Update + history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn update_appends_one_history_entry_with_exact_diff(pool: PgPool) {
    let owner = Uuid::new_v4();
    let buyer = seed_buyer(&pool, owner, "Jane Doe", "9998887776").await;
    let app = common::build_test_app(pool);
    let token = agent_token(owner);
    let uri = format!("/api/v1/buyers/{}", buyer.id);

    let response = put_json(
        app.clone(),
        &uri,
        &token,
        serde_json::json!({
            "status": "Qualified",
            "notes": "met at site visit",
            // Provided but unchanged: must not appear in the diff.
            "city": "Mohali",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = body_json(response).await;
    assert_eq!(updated["status"], "Qualified");
    assert_eq!(updated["notes"], "met at site visit");

    let detail = body_json(get(app, &uri, &token).await).await;
    let history = detail["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);

    let diff = history[0]["diff"].as_object().unwrap();
    assert_eq!(diff.len(), 2);
    assert_eq!(diff["status"]["old"], "New");
    assert_eq!(diff["status"]["new"], "Qualified");
    assert_eq!(diff["notes"]["old"], serde_json::Value::Null);
    assert_eq!(diff["notes"]["new"], "met at site visit");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_with_identical_values_appends_no_history(pool: PgPool) {
    let owner = Uuid::new_v4();
    let buyer = seed_buyer(&pool, owner, "Jane Doe", "9998887776").await;
    let app = common::build_test_app(pool);
    let token = agent_token(owner);
    let uri = format!("/api/v1/buyers/{}", buyer.id);

    let response = put_json(
        app.clone(),
        &uri,
        &token,
        serde_json::json!({ "full_name": "Jane Doe", "phone": "9998887776" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let detail = body_json(get(app, &uri, &token).await).await;
    assert_eq!(detail["history"], serde_json::json!([]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn stale_updated_at_conflicts_and_changes_nothing(pool: PgPool) {
    let owner = Uuid::new_v4();
    let buyer = seed_buyer(&pool, owner, "Jane Doe", "9998887776").await;
    let app = common::build_test_app(pool);
    let token = agent_token(owner);
    let uri = format!("/api/v1/buyers/{}", buyer.id);

    // An expected timestamp more than the 1s tolerance behind the stored one.
    let stale = buyer.updated_at - chrono::Duration::seconds(10);
    let response = put_json(
        app.clone(),
        &uri,
        &token,
        serde_json::json!({ "status": "Dropped", "updatedAt": stale.to_rfc3339() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let detail = body_json(get(app.clone(), &uri, &token).await).await;
    assert_eq!(detail["buyer"]["status"], "New");
    assert_eq!(detail["history"], serde_json::json!([]));

    // The exact stored timestamp is accepted.
    let response = put_json(
        app,
        &uri,
        &token,
        serde_json::json!({
            "status": "Contacted",
            "updatedAt": buyer.updated_at.to_rfc3339(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_is_owner_scoped(pool: PgPool) {
    let owner = Uuid::new_v4();
    let buyer = seed_buyer(&pool, owner, "Jane Doe", "9998887776").await;
    let app = common::build_test_app(pool);
    let uri = format!("/api/v1/buyers/{}", buyer.id);
    let body = serde_json::json!({ "status": "Visited" });

    let response = put_json(app.clone(), &uri, &agent_token(Uuid::new_v4()), body.clone()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = put_json(app, &uri, &admin_token(Uuid::new_v4()), body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_nonexistent_buyer_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = agent_token(Uuid::new_v4());

    let response = put_json(
        app,
        &format!("/api/v1/buyers/{}", Uuid::new_v4()),
        &token,
        serde_json::json!({ "status": "Visited" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_buyer_returns_ok_then_404(pool: PgPool) {
    let owner = Uuid::new_v4();
    let buyer = seed_buyer(&pool, owner, "Jane Doe", "9998887776").await;
    let app = common::build_test_app(pool);
    let token = agent_token(owner);
    let uri = format!("/api/v1/buyers/{}", buyer.id);

    let response = delete(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ok"], true);

    let response = delete(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(app, &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn list_paginates_and_reports_total(pool: PgPool) {
    let owner = Uuid::new_v4();
    for i in 0..12 {
        seed_buyer(&pool, owner, &format!("Buyer {i:02}"), "9998887776").await;
    }
    // Another owner's rows must not leak into the count.
    seed_buyer(&pool, Uuid::new_v4(), "Someone Else", "8887776665").await;

    let app = common::build_test_app(pool);
    let token = agent_token(owner);

    let response = get(app.clone(), "/api/v1/buyers?page=2&page_size=5", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["rows"].as_array().unwrap().len(), 5);
    assert_eq!(json["total"], 12);

    let response = get(app, "/api/v1/buyers?page=3&page_size=5", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["rows"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_filters_and_searches(pool: PgPool) {
    let owner = Uuid::new_v4();
    seed_buyer(&pool, owner, "Amit Sharma", "9991110001").await;
    seed_buyer(&pool, owner, "Priya Verma", "9992220002").await;
    let app = common::build_test_app(pool.clone());
    let token = agent_token(owner);

    // Free-text search matches phone substrings...
    let json = body_json(get(app.clone(), "/api/v1/buyers?search=222000", &token).await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["rows"][0]["full_name"], "Priya Verma");

    // ...and names, case-insensitively.
    let json = body_json(get(app.clone(), "/api/v1/buyers?search=amit", &token).await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["rows"][0]["full_name"], "Amit Sharma");

    // Exact-match filters.
    let json = body_json(get(app.clone(), "/api/v1/buyers?status=New", &token).await).await;
    assert_eq!(json["total"], 2);
    let json =
        body_json(get(app.clone(), "/api/v1/buyers?status=Converted", &token).await).await;
    assert_eq!(json["total"], 0);

    // Sorting by name ascending.
    let json = body_json(
        get(app, "/api/v1/buyers?sort=full_name&order=asc", &token).await,
    )
    .await;
    assert_eq!(json["rows"][0]["full_name"], "Amit Sharma");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_rejects_invalid_filter_values(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = agent_token(Uuid::new_v4());

    let response = get(app.clone(), "/api/v1/buyers?city=Delhi", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["issues"][0]["field"], "city");

    let response = get(app, "/api/v1/buyers?sort=owner_id", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_list_spans_all_owners(pool: PgPool) {
    seed_buyer(&pool, Uuid::new_v4(), "Jane Doe", "9998887776").await;
    seed_buyer(&pool, Uuid::new_v4(), "John Roe", "8887776665").await;

    let app = common::build_test_app(pool);

    let json = body_json(
        get(app, "/api/v1/buyers", &admin_token(Uuid::new_v4())).await,
    )
    .await;
    assert_eq!(json["total"], 2);
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn sixth_create_within_window_is_rate_limited(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = agent_token(Uuid::new_v4());

    for i in 0..5 {
        let response = post_json(
            app.clone(),
            "/api/v1/buyers",
            &token,
            buyer_payload(&format!("Buyer {i}"), "9998887776"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED, "create #{i}");
    }

    let response = post_json(
        app.clone(),
        "/api/v1/buyers",
        &token,
        buyer_payload("One Too Many", "9998887776"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["code"], "RATE_LIMITED");

    // A different user has their own bucket.
    let response = post_json(
        app,
        "/api/v1/buyers",
        &agent_token(Uuid::new_v4()),
        buyer_payload("Fresh Bucket", "9998887776"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}
