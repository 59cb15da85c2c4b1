//! Session analytics.

use std::sync::Arc;

use serde_json::json;

use crate::domain::analytics::{AnalyticsSummary, summarize};
use crate::domain::repositories::{LinkRepository, LinkTotals};
use crate::error::AppError;

/// Service for dashboard statistics.
///
/// Results are recomputed from the click history on every call; there is no
/// materialized view and no caching.
pub struct AnalyticsService<R: LinkRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: LinkRepository + ?Sized> AnalyticsService<R> {
    /// Creates a new analytics service.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Aggregates every link owned by `session_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the session ID is missing.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn summary(&self, session_id: &str) -> Result<AnalyticsSummary, AppError> {
        if session_id.trim().is_empty() {
            return Err(AppError::unauthorized("Missing session ID", json!({})));
        }

        let activity = self.repository.activity_by_session(session_id).await?;
        Ok(summarize(&activity))
    }

    /// Store-wide link and click counters.
    pub async fn totals(&self) -> Result<LinkTotals, AppError> {
        self.repository.totals().await
    }
}
