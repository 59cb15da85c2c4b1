//! Query of the analytics endpoint. The response is
//! [`crate::domain::analytics::AnalyticsSummary`] as is.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub session_id: String,
}
