//! Handler for the buyer CSV export endpoint.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use leadbase_core::csv::write_row;
use leadbase_db::models::buyer::Buyer;
use leadbase_db::repositories::BuyerRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::buyers::{parse_list_params, BuyerListParams};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// CSV header row, matching the snake_case field names of the API payloads.
const EXPORT_HEADERS: &[&str] = &[
    "id",
    "full_name",
    "email",
    "phone",
    "city",
    "property_type",
    "bhk",
    "purpose",
    "budget_min",
    "budget_max",
    "timeline",
    "source",
    "status",
    "notes",
    "tags",
    "owner_id",
    "created_at",
    "updated_at",
];

/// GET /api/v1/export
///
/// Download the caller's buyers (same filters as the list endpoint) as CSV,
/// capped at 1000 rows. Tags are joined with `;`.
pub async fn export_buyers(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BuyerListParams>,
) -> AppResult<impl IntoResponse> {
    let (filter, sort, order) = parse_list_params(&params)?;

    let rows =
        BuyerRepo::export_rows(&state.pool, auth.owner_scope(), &filter, sort, order).await?;

    tracing::info!(rows = rows.len(), user_id = %auth.user_id, "Buyers exported");

    let csv = buyers_to_csv(&rows);

    axum::response::Response::builder()
        .status(200)
        .header("Content-Type", "text/csv; charset=utf-8")
        .header("Content-Disposition", "attachment; filename=\"buyers.csv\"")
        .body(axum::body::Body::from(csv))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

/// Encode buyers as CSV with a header row.
fn buyers_to_csv(rows: &[Buyer]) -> String {
    let mut out = String::new();
    write_row(
        &mut out,
        &EXPORT_HEADERS
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>(),
    );

    for buyer in rows {
        let fields = vec![
            buyer.id.to_string(),
            buyer.full_name.clone(),
            buyer.email.clone().unwrap_or_default(),
            buyer.phone.clone(),
            buyer.city.clone(),
            buyer.property_type.clone(),
            buyer.bhk.clone().unwrap_or_default(),
            buyer.purpose.clone(),
            buyer.budget_min.map(|v| v.to_string()).unwrap_or_default(),
            buyer.budget_max.map(|v| v.to_string()).unwrap_or_default(),
            buyer.timeline.clone(),
            buyer.source.clone(),
            buyer.status.clone(),
            buyer.notes.clone().unwrap_or_default(),
            buyer.tags.join(";"),
            buyer.owner_id.to_string(),
            buyer.created_at.to_rfc3339(),
            buyer.updated_at.to_rfc3339(),
        ];
        write_row(&mut out, &fields);
    }

    out
}
