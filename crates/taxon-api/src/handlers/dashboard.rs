//! Dashboard and period statistics.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;

use taxon_core::{defaults, DashboardStats, StatsPeriod};

use crate::auth::RequireAuth;
use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub period: Option<String>,
}

/// Counts for the last week plus the most frequent labels.
pub async fn dashboard(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let since = Utc::now() - Duration::days(defaults::DASHBOARD_WINDOW_DAYS);
    let recent_stats = state.stats.counts_since(&auth.user, since).await?;
    let classification_distribution = state
        .stats
        .label_distribution(&auth.user, defaults::DASHBOARD_TOP_LABELS)
        .await?;

    Ok(Json(DashboardStats {
        recent_stats,
        classification_distribution,
    }))
}

pub async fn stats(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let period: StatsPeriod = match query.period.as_deref() {
        Some(p) => p.parse().unwrap_or_default(),
        None => StatsPeriod::default(),
    };
    let since = Utc::now() - Duration::days(period.days());
    let counts = state.stats.counts_since(&auth.user, since).await?;
    Ok(Json(counts))
}
