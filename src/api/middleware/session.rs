//! Signed session cookie principal.
//!
//! The authenticated user is separate from the anonymous `sessionId` owner
//! key; link endpoints never look at this cookie.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;

use crate::domain::entities::User;
use crate::error::AppError;
use crate::state::AppState;

/// Name of the HTTP-only cookie carrying the session JWT.
pub const SESSION_COOKIE: &str = "token";

/// Extracts and verifies the session cookie.
///
/// # Errors
///
/// Rejects with `401 Unauthorized` if the cookie is missing, the token is
/// invalid or expired, or the user no longer exists.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("Not authenticated", json!({})))?;

        let user = state.user_service.authenticate(&token).await?;
        Ok(Self(user))
    }
}

/// Cookie carrying a freshly issued session token.
pub fn session_cookie(token: String, max_age: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// Expired cookie that makes the browser drop the session.
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(0))
        .build()
}
