//! Category group handlers.
//!
//! Groups are shared by every user; the creating user is recorded but does
//! not scope visibility.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use taxon_core::{CategoryGroupInput, CategoryInput, ToggleActiveResponse};

use crate::auth::RequireAuth;
use crate::{ApiError, AppState};

pub async fn list_groups(
    State(state): State<AppState>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let groups = state.groups.list().await?;
    Ok(Json(groups))
}

pub async fn create_group(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(input): Json<CategoryGroupInput>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state.groups.create(input, &auth.user).await?;
    info!(
        subsystem = "api",
        component = "category_groups",
        op = "create",
        group_id = %group.id,
        group_name = %group.name,
        user = %auth.user,
        "Category group created"
    );
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get_group(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state.groups.get(id).await?;
    Ok(Json(group))
}

pub async fn update_group(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryGroupInput>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state.groups.update(id, input).await?;
    Ok(Json(group))
}

pub async fn delete_group(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.groups.delete(id).await?;
    info!(
        subsystem = "api",
        component = "category_groups",
        op = "delete",
        group_id = %id,
        "Category group deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_active(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state.groups.toggle_active(id).await?;
    Ok(Json(ToggleActiveResponse::from(&group)))
}

pub async fn list_categories(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.groups.list_categories(id).await?;
    Ok(Json(categories))
}

pub async fn add_category(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.groups.add_category(id, input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}
