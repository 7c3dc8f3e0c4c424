//! Handlers for buyer CRUD, listing, and detail endpoints.
//!
//! All endpoints require authentication via [`AuthUser`]. Reads and writes
//! are scoped to the caller's own records; admins operate across all owners.
//! The create and update endpoints are guarded by the per-(user, route)
//! token-bucket rate limiter.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use leadbase_core::error::CoreError;
use leadbase_core::rate_limit::rate_limit_key;
use leadbase_core::search::{clamp_page, clamp_page_size, RECENT_HISTORY_LIMIT};
use leadbase_core::types::{DbId, Timestamp};
use leadbase_core::validation::{
    FieldIssue, CITIES, PROPERTY_TYPES, STATUSES, TIMELINES,
};
use leadbase_db::models::buyer::{
    Buyer, BuyerFilter, BuyerPage, CreateBuyer, SortColumn, SortOrder, UpdateBuyer,
};
use leadbase_db::models::buyer_history::BuyerHistory;
use leadbase_db::repositories::{BuyerHistoryRepo, BuyerRepo, BuyerUpdateError};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / query parameter types
// ---------------------------------------------------------------------------

/// Query parameters for buyer listing and export.
#[derive(Debug, Default, Deserialize)]
pub struct BuyerListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub status: Option<String>,
    pub timeline: Option<String>,
    pub updated_from: Option<String>,
    pub updated_to: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Body of a buyer update: the partial field map plus the caller's last
/// observed `updatedAt` for optimistic concurrency.
#[derive(Debug, Deserialize)]
pub struct UpdateBuyerRequest {
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<Timestamp>,
    #[serde(flatten)]
    pub fields: UpdateBuyer,
}

/// Buyer detail payload: the row plus its most recent history entries.
#[derive(Debug, Serialize)]
pub struct BuyerDetail {
    pub buyer: Buyer,
    pub history: Vec<BuyerHistory>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Logical route names used as rate-limit bucket keys.
const ROUTE_CREATE_BUYER: &str = "create_buyer";
const ROUTE_UPDATE_BUYER: &str = "update_buyer";

/// Parse and validate list/export query parameters into a repository filter
/// and sort. Invalid enum values are reported field-by-field.
pub(crate) fn parse_list_params(
    params: &BuyerListParams,
) -> AppResult<(BuyerFilter, SortColumn, SortOrder)> {
    let mut issues = Vec::new();

    let mut check_filter = |field: &str, value: &Option<String>, allowed: &[&str]| {
        if let Some(value) = value {
            if !allowed.contains(&value.as_str()) {
                issues.push(FieldIssue::new(
                    field,
                    format!("{field} must be one of: {}", allowed.join(", ")),
                ));
            }
        }
    };

    check_filter("city", &params.city, CITIES);
    check_filter("property_type", &params.property_type, PROPERTY_TYPES);
    check_filter("status", &params.status, STATUSES);
    check_filter("timeline", &params.timeline, TIMELINES);

    let updated_from = parse_timestamp_param(&mut issues, "updated_from", &params.updated_from);
    let updated_to = parse_timestamp_param(&mut issues, "updated_to", &params.updated_to);

    let sort = match &params.sort {
        Some(value) => match SortColumn::parse(value) {
            Some(column) => column,
            None => {
                issues.push(FieldIssue::new(
                    "sort",
                    "sort must be one of: updated_at, created_at, full_name",
                ));
                SortColumn::default()
            }
        },
        None => SortColumn::default(),
    };

    let order = match &params.order {
        Some(value) => match SortOrder::parse(value) {
            Some(order) => order,
            None => {
                issues.push(FieldIssue::new("order", "order must be asc or desc"));
                SortOrder::default()
            }
        },
        None => SortOrder::default(),
    };

    if !issues.is_empty() {
        return Err(AppError::Validation(issues));
    }

    let filter = BuyerFilter {
        city: params.city.clone(),
        property_type: params.property_type.clone(),
        status: params.status.clone(),
        timeline: params.timeline.clone(),
        search: params.search.clone().filter(|s| !s.trim().is_empty()),
        updated_from,
        updated_to,
    };

    Ok((filter, sort, order))
}

/// Parse an optional ISO 8601 timestamp query parameter.
fn parse_timestamp_param(
    issues: &mut Vec<FieldIssue>,
    field: &str,
    value: &Option<String>,
) -> Option<Timestamp> {
    let value = value.as_deref()?;
    match value.parse::<Timestamp>() {
        Ok(ts) => Some(ts),
        Err(_) => {
            issues.push(FieldIssue::new(field, "must be an ISO 8601 timestamp"));
            None
        }
    }
}

fn buyer_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Buyer",
        id,
    })
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/buyers
///
/// Paginated, filterable, sorted listing scoped to the caller (all owners
/// for admins). Returns the page's rows plus the total matching count.
pub async fn list_buyers(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BuyerListParams>,
) -> AppResult<impl IntoResponse> {
    let (filter, sort, order) = parse_list_params(&params)?;
    let page = clamp_page(params.page);
    let page_size = clamp_page_size(params.page_size);
    let owner = auth.owner_scope();

    let rows = BuyerRepo::list(&state.pool, owner, &filter, sort, order, page, page_size).await?;
    let total = BuyerRepo::count(&state.pool, owner, &filter).await?;

    Ok(Json(BuyerPage { rows, total }))
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/buyers
///
/// Create a buyer owned by the caller. Rate limited per user.
pub async fn create_buyer(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<CreateBuyer>,
) -> AppResult<impl IntoResponse> {
    let key = rate_limit_key(auth.user_id, ROUTE_CREATE_BUYER);
    if !state.rate_limiter.allow(
        &key,
        state.config.create_rate_limit,
        state.config.rate_limit_window_ms,
    ) {
        return Err(AppError::RateLimited);
    }

    input.normalize();
    let issues = input.validate();
    if !issues.is_empty() {
        return Err(AppError::Validation(issues));
    }

    let buyer = BuyerRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(buyer_id = %buyer.id, user_id = %auth.user_id, "Buyer created");

    Ok((StatusCode::CREATED, Json(buyer)))
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

/// GET /api/v1/buyers/{id}
///
/// Fetch one buyer plus its most recent history entries.
pub async fn get_buyer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let buyer = BuyerRepo::find_by_id(&state.pool, id, auth.owner_scope())
        .await?
        .ok_or_else(|| buyer_not_found(id))?;

    let history = BuyerHistoryRepo::list_recent(&state.pool, id, RECENT_HISTORY_LIMIT).await?;

    Ok(Json(BuyerDetail { buyer, history }))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /api/v1/buyers/{id}
///
/// Apply a partial update with optimistic concurrency control. A stale
/// `updatedAt` yields 409; the caller should re-fetch and retry. Rate
/// limited per user.
pub async fn update_buyer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<UpdateBuyerRequest>,
) -> AppResult<impl IntoResponse> {
    let key = rate_limit_key(auth.user_id, ROUTE_UPDATE_BUYER);
    if !state.rate_limiter.allow(
        &key,
        state.config.update_rate_limit,
        state.config.rate_limit_window_ms,
    ) {
        return Err(AppError::RateLimited);
    }

    let mut input = body.fields;
    input.normalize();
    let issues = input.validate();
    if !issues.is_empty() {
        return Err(AppError::Validation(issues));
    }

    let tolerance = chrono::Duration::milliseconds(state.config.conflict_tolerance_ms);
    let updated = BuyerRepo::update_with_history(
        &state.pool,
        id,
        auth.user_id,
        auth.owner_scope(),
        &input,
        body.updated_at,
        tolerance,
    )
    .await
    .map_err(|err| match err {
        BuyerUpdateError::NotFound => buyer_not_found(id),
        BuyerUpdateError::Conflict => AppError::Core(CoreError::Conflict(
            "Buyer was modified by another request; re-fetch and retry".into(),
        )),
        BuyerUpdateError::Database(err) => AppError::Database(err),
    })?;

    tracing::info!(buyer_id = %id, user_id = %auth.user_id, "Buyer updated");

    Ok(Json(updated.after))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/v1/buyers/{id}
///
/// Delete a buyer; its history is removed by cascade.
pub async fn delete_buyer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = BuyerRepo::delete(&state.pool, id, auth.owner_scope()).await?;

    if !deleted {
        return Err(buyer_not_found(id));
    }

    tracing::info!(buyer_id = %id, user_id = %auth.user_id, "Buyer deleted");

    Ok(Json(DeleteResponse { ok: true }))
}
