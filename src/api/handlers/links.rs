//! Handlers for link management endpoints (create, list, delete, alias, expiration).

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde_json::json;

use crate::api::dto::links::{
    BulkDeleteRequest, CreateLinkRequest, CreateLinkResponse, DeleteLinksResponse, LinkQuery,
    LinkView, ListLinksQuery, UpdateAliasRequest, UpdateExpirationRequest, ValidateAliasQuery,
    ValidateAliasResponse,
};
use crate::application::services::CreateLink;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for the caller's session.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "originalUrl": "https://example.com",
///   "sessionId": "6f1c...",
///   "customAlias": "my-link",        // optional
///   "customDomain": "go.brand.com",  // optional
///   "expirationType": "clicks",      // optional: none | datetime | clicks
///   "expireAfterClicks": 10          // required for clicks
/// }
/// ```
///
/// # Errors
///
/// - 400 for a missing URL, malformed URL or alias, or incomplete expiration
/// - 401 without a session ID
/// - 409 if the alias is taken
pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<Json<CreateLinkResponse>, AppError> {
    let command = CreateLink::try_from(payload)?;
    let link = state.link_service.create(command).await?;

    Ok(Json(CreateLinkResponse {
        short_url: link.full_short_url,
        custom_alias: link.custom_alias,
    }))
}

/// Lists the session's links, newest first.
///
/// `GET /api/links?sessionId=...&showBulk=true`
///
/// Bulk-imported links are hidden unless `showBulk` is set.
pub async fn list_links_handler(
    State(state): State<AppState>,
    Query(query): Query<ListLinksQuery>,
) -> Result<Json<Vec<LinkView>>, AppError> {
    let links = state
        .link_service
        .list(&query.session_id, query.show_bulk)
        .await?;

    let now = Utc::now();
    Ok(Json(
        links.into_iter().map(|l| LinkView::new(l, now)).collect(),
    ))
}

/// Deletes one link or a set of links owned by the session.
///
/// - Single: `DELETE /api/links?id=42&sessionId=...`
/// - Bulk: `DELETE /api/links` with body `{"ids": [1, 2, 3], "sessionId": "..."}`
///
/// Ids that belong to another session are skipped silently in bulk mode.
/// The session ID may come from the query or the body.
///
/// # Errors
///
/// - 400 when neither an id nor a non-empty `ids` list is given
/// - 404 when a single id is not owned by the session
pub async fn delete_links_handler(
    State(state): State<AppState>,
    Query(query): Query<LinkQuery>,
    body: Option<Json<BulkDeleteRequest>>,
) -> Result<Json<DeleteLinksResponse>, AppError> {
    let (ids, body_session) = match body {
        Some(Json(req)) => (req.ids, req.session_id),
        None => (Vec::new(), None),
    };
    let session_id = query.session_id.or(body_session).unwrap_or_default();

    if !ids.is_empty() {
        let deleted = state.link_service.delete_many(ids, &session_id).await?;
        return Ok(Json(DeleteLinksResponse {
            success: true,
            deleted,
        }));
    }

    let id = query
        .id
        .ok_or_else(|| AppError::bad_request("Missing parameters", json!({})))?;
    state.link_service.delete(id, &session_id).await?;

    Ok(Json(DeleteLinksResponse {
        success: true,
        deleted: 1,
    }))
}

/// Replaces a link's alias; the short code follows the alias.
///
/// `PUT /api/links?id=42&sessionId=...` with body `{"customAlias": "new-name"}`
pub async fn update_alias_handler(
    State(state): State<AppState>,
    Query(query): Query<LinkQuery>,
    Json(payload): Json<UpdateAliasRequest>,
) -> Result<Json<LinkView>, AppError> {
    let (Some(id), Some(session_id)) = (query.id, query.session_id) else {
        return Err(AppError::bad_request("Missing parameters", json!({})));
    };

    let link = state
        .link_service
        .update_alias(id, &session_id, &payload.custom_alias)
        .await?;

    Ok(Json(LinkView::new(link, Utc::now())))
}

/// Replaces a link's expiration policy.
///
/// `PATCH /api/links` with body
/// `{"id": 42, "expirationType": "datetime", "expiresAt": "2030-01-01T00:00:00Z"}`.
///
/// A bound that is already met is stored as expired right away.
pub async fn update_expiration_handler(
    State(state): State<AppState>,
    Json(payload): Json<UpdateExpirationRequest>,
) -> Result<Json<LinkView>, AppError> {
    let session_id = payload.session_id.clone().filter(|s| !s.is_empty());
    let link = state
        .link_service
        .update_expiration(payload.id, session_id, payload.update())
        .await?;

    Ok(Json(LinkView::new(link, Utc::now())))
}

/// `GET /api/links/validate?alias=...`
///
/// Read-only; answers the same until the alias is actually taken.
pub async fn validate_alias_handler(
    State(state): State<AppState>,
    Query(query): Query<ValidateAliasQuery>,
) -> Result<Json<ValidateAliasResponse>, AppError> {
    let availability = state.link_service.check_alias(&query.alias).await?;

    Ok(Json(ValidateAliasResponse {
        valid: availability.valid,
        available: availability.available,
        message: availability.message,
    }))
}
