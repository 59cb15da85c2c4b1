//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};

use super::click::click_context;
use crate::api::middleware::client_ip::ClientIp;
use crate::error::AppError;
use crate::state::AppState;
use crate::web::pages::{ExpiredPage, NotFoundPage};

/// Resolves a short code for a browser.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Outcomes
///
/// - `307 Temporary Redirect` to the destination; the click is recorded
/// - `410 Gone` with the expired page
/// - `404 Not Found` with the not-found page
///
/// The request's `Host` selects among branded domains: a link created with a
/// custom domain does not resolve on another branded host.
///
/// Other failures fall through to the JSON error body with `500`.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    ip: ClientIp,
    headers: HeaderMap,
) -> Response {
    let home_url = state.settings.base_url.clone();

    let ctx = click_context(ip, &headers);
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    let outcome = match host {
        Some(host) => state.click_service.record_on_host(host, &code, ctx).await,
        None => state.click_service.record(&code, ctx).await,
    };

    match outcome {
        Ok(destination) => Redirect::temporary(&destination).into_response(),
        Err(AppError::Gone { .. }) => {
            (StatusCode::GONE, ExpiredPage { code, home_url }).into_response()
        }
        Err(AppError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, NotFoundPage { code, home_url }).into_response()
        }
        Err(e) => e.into_response(),
    }
}
