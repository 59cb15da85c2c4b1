//! Handlers that record clicks: the JSON click endpoint and session issuance.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, header},
};
use uuid::Uuid;

use crate::api::dto::click::{ClickResponse, SessionResponse};
use crate::api::middleware::client_ip::ClientIp;
use crate::application::services::ClickContext;
use crate::error::AppError;
use crate::state::AppState;

pub(crate) fn click_context(ip: ClientIp, headers: &HeaderMap) -> ClickContext {
    ClickContext {
        ip: ip.0,
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// Records a click and returns the destination for client-side navigation.
///
/// `GET /api/click/{slug}`
///
/// # Errors
///
/// - 404 if no link uses the code
/// - 410 if the link has expired; the click is not recorded
pub async fn click_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    ip: ClientIp,
    headers: HeaderMap,
) -> Result<Json<ClickResponse>, AppError> {
    let redirect_to = state
        .click_service
        .record(&slug, click_context(ip, &headers))
        .await?;

    Ok(Json(ClickResponse { redirect_to }))
}

/// Issues a fresh anonymous owner key.
///
/// `POST /api/session`
pub async fn session_handler() -> Json<SessionResponse> {
    Json(SessionResponse {
        session_id: Uuid::new_v4().to_string(),
    })
}
