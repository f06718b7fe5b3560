//! Email classification rule handlers.
//!
//! Rules are shared by every user, like category groups.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{debug, info};
use uuid::Uuid;

use taxon_classify::{evaluate_rule, first_match};
use taxon_core::{validate_email_rule_input, EmailRuleInput, EmailSample, TestRuleRequest};

use crate::auth::RequireAuth;
use crate::{ApiError, AppState};

pub async fn list_rules(
    State(state): State<AppState>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let rules = state.rules.list().await?;
    Ok(Json(rules))
}

pub async fn create_rule(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(input): Json<EmailRuleInput>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = state.rules.create(input).await?;
    info!(
        subsystem = "api",
        component = "email_rules",
        op = "create",
        rule_id = %rule.id,
        rule_name = %rule.name,
        user = %auth.user,
        "Email rule created"
    );
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn get_rule(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = state.rules.get(id).await?;
    Ok(Json(rule))
}

pub async fn update_rule(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(input): Json<EmailRuleInput>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = state.rules.update(id, input).await?;
    Ok(Json(rule))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.rules.delete(id).await?;
    info!(
        subsystem = "api",
        component = "email_rules",
        op = "delete",
        rule_id = %id,
        "Email rule deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Dry-run an unsaved rule against a sample email.
pub async fn test_rule(
    _auth: RequireAuth,
    Json(request): Json<TestRuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email_rule_input(&request.rule)?;
    let evaluation = evaluate_rule(&request.rule, &request.email);
    debug!(
        subsystem = "api",
        component = "email_rules",
        op = "test_rule",
        matches = evaluation.matches,
        "Rule tested"
    );
    Ok(Json(evaluation))
}

/// Run every active rule against a sample email; `null` when none matches.
pub async fn evaluate_rules(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Json(email): Json<EmailSample>,
) -> Result<impl IntoResponse, ApiError> {
    let rules = state.rules.list_active().await?;
    Ok(Json(first_match(&rules, &email)))
}
