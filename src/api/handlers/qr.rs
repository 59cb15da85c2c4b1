//! Handlers for QR targets.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::dto::qr::{CreateQrRequest, CreateQrResponse, ScanQuery};
use crate::error::AppError;
use crate::state::AppState;

/// Stores a QR target. Rendering the image is left to the client, which
/// encodes `scanUrl`.
///
/// `POST /api/qr` with body `{"url": "...", "password": "...", "expiresAt": "..."}`
pub async fn create_qr_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateQrRequest>,
) -> Result<Json<CreateQrResponse>, AppError> {
    payload.validate()?;

    let qr = state.qr_service.create(payload.into()).await?;

    Ok(Json(CreateQrResponse {
        scan_url: state.qr_service.scan_url(qr.uuid),
        protected: qr.is_protected(),
        uuid: qr.uuid,
        url: qr.url,
        expires_at: qr.expires_at,
    }))
}

/// Counts a scan and redirects to the target.
///
/// `GET /api/qr/scan/{uuid}?password=...`
///
/// # Errors
///
/// - 401 if the code is protected and the password is missing or wrong
/// - 404 for an unknown UUID
/// - 410 once the code has expired
pub async fn scan_qr_handler(
    Path(uuid): Path<Uuid>,
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> Result<Redirect, AppError> {
    let target = state
        .qr_service
        .scan(uuid, query.password.as_deref())
        .await?;

    Ok(Redirect::temporary(&target))
}
