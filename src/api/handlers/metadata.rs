//! Handler for link previews.

use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::json;

use crate::api::dto::metadata::MetadataQuery;
use crate::error::AppError;
use crate::infrastructure::metadata::MetadataResult;
use crate::state::AppState;
use crate::utils::url_validator::parse_destination;

/// Fetches open-graph metadata for a URL.
///
/// `GET /api/metadata?url=https://example.com`
///
/// Fetch failures are not errors: the answer degrades to `success: 0` with a
/// hostname title and the default favicon.
///
/// # Errors
///
/// Returns 400 when `url` is missing or is not an HTTP(S) URL.
pub async fn metadata_handler(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> Result<Json<MetadataResult>, AppError> {
    let raw = query
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Missing URL parameter", json!({})))?;

    let url = parse_destination(&raw)
        .map_err(|e| AppError::bad_request(e.to_string(), json!({ "url": raw })))?;

    Ok(Json(state.metadata.fetch(&url).await))
}
