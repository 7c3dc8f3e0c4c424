pub mod buyers;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /buyers            list (GET), create (POST)
/// /buyers/{id}       get, update (PUT), delete
/// /tags              tag autocomplete (GET)
/// /export            CSV download (GET)
/// /import            transactional CSV import (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/buyers", buyers::router())
        .route("/tags", get(handlers::tags::suggest_tags))
        .route("/export", get(handlers::export::export_buyers))
        .route("/import", post(handlers::import::import_buyers))
}
