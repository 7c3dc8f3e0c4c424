//! Handler for tag autocomplete.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use leadbase_core::search::clamp_suggest_limit;
use leadbase_db::repositories::BuyerRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Query parameters for tag suggestions.
#[derive(Debug, Deserialize)]
pub struct TagSuggestParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TagSuggestions {
    pub tags: Vec<String>,
}

/// GET /api/v1/tags
///
/// Distinct tag suggestions across the caller's own buyers, case-insensitive
/// substring match on `q`. Suggestions are always owner-scoped, admins
/// included -- autocomplete offers your own vocabulary, not everyone's.
pub async fn suggest_tags(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TagSuggestParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_suggest_limit(params.limit);
    let q = params.q.as_deref().unwrap_or("").trim().to_string();

    let tags = BuyerRepo::suggest_tags(&state.pool, auth.user_id, &q, limit).await?;

    Ok(Json(TagSuggestions { tags }))
}
