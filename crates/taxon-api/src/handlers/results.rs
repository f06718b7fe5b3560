//! Classification result history.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use taxon_core::defaults;

use crate::auth::RequireAuth;
use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ResultQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Newest results of the requesting user.
pub async fn list_results(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<ResultQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(defaults::RESULT_PAGE_LIMIT)
        .clamp(1, defaults::PAGE_SIZE_MAX as i64);
    let offset = query.offset.unwrap_or(0).max(0);

    let results = state
        .results
        .list(Some(&auth.user), limit, offset)
        .await?;
    Ok(Json(results))
}

pub async fn get_result(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.results.get(id).await?;
    if result.created_by != auth.user {
        return Err(ApiError::NotFound(format!(
            "Not found: classification result {}",
            id
        )));
    }
    Ok(Json(result))
}
