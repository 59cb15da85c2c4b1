//! Handler for bulk link import.

use axum::{Json, extract::State};

use crate::api::dto::bulk::{BulkCreateRequest, BulkCreateResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Shortens a list of URLs under one batch id.
///
/// # Endpoint
///
/// `POST /api/bulk`
///
/// # Request Body
///
/// ```json
/// { "urls": ["https://a.example", "https://b.example"], "sessionId": "..." }
/// ```
///
/// URLs are processed in order and independently: a bad URL gets an `error`
/// entry and the rest continue. The batch size is capped by `BULK_MAX_URLS`.
///
/// # Errors
///
/// - 400 for an empty or oversized batch
/// - 401 without a session ID
pub async fn bulk_create_handler(
    State(state): State<AppState>,
    Json(payload): Json<BulkCreateRequest>,
) -> Result<Json<BulkCreateResponse>, AppError> {
    let outcome = state
        .link_service
        .bulk_create(payload.urls, &payload.session_id)
        .await?;

    Ok(Json(outcome.into()))
}
