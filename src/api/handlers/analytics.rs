//! Handler for the session analytics dashboard.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::dto::analytics::AnalyticsQuery;
use crate::domain::analytics::AnalyticsSummary;
use crate::error::AppError;
use crate::state::AppState;

/// Aggregates clicks across every link owned by the session.
///
/// `GET /api/analytics?sessionId=...`
///
/// Returns totals, unique visitors, per-country and per-device breakdowns,
/// the top five links and a daily timeline. Recomputed on every call.
pub async fn analytics_handler(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let summary = state.analytics_service.summary(&query.session_id).await?;
    Ok(Json(summary))
}
