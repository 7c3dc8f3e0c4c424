//! Handler for the transactional buyer CSV import endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use leadbase_core::search::MAX_IMPORT_ROWS;
use leadbase_core::validation::FieldIssue;
use leadbase_db::models::buyer::CreateBuyer;
use leadbase_db::repositories::BuyerRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Import request body: pre-parsed CSV rows in create-payload shape.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub rows: Vec<CreateBuyer>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub inserted: u64,
}

/// POST /api/v1/import
///
/// Validate every row individually and insert all of them in one statement.
/// No partial success: any invalid row rejects the whole batch before the
/// store is touched, and a constraint violation mid-insert rolls back all
/// rows. The row cap is enforced before any validation work.
pub async fn import_buyers(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<ImportRequest>,
) -> AppResult<impl IntoResponse> {
    if body.rows.len() > MAX_IMPORT_ROWS {
        return Err(AppError::BadRequest(format!(
            "Max {MAX_IMPORT_ROWS} rows allowed per import"
        )));
    }

    let mut rows = body.rows;
    let mut issues: Vec<FieldIssue> = Vec::new();
    for (i, row) in rows.iter_mut().enumerate() {
        row.normalize();
        for issue in row.validate() {
            issues.push(FieldIssue::new(
                format!("rows[{i}].{}", issue.field),
                issue.message,
            ));
        }
    }
    if !issues.is_empty() {
        return Err(AppError::Validation(issues));
    }

    if rows.is_empty() {
        return Ok(Json(ImportResponse { inserted: 0 }));
    }

    let inserted = BuyerRepo::insert_many(&state.pool, auth.user_id, &rows).await?;

    tracing::info!(inserted, user_id = %auth.user_id, "Buyers imported");

    Ok(Json(ImportResponse { inserted }))
}
