//! API route configuration.
//!
//! Link endpoints are scoped by the anonymous `sessionId` owner key passed
//! in the query or body. The auth family is layered on top through the
//! signed `token` cookie; it does not replace the owner key.

use crate::api::handlers::{
    analytics_handler, bulk_create_handler, click_handler, create_link_handler,
    create_qr_handler, delete_links_handler, list_links_handler, login_handler, logout_handler,
    metadata_handler, register_handler, request_password_reset_handler, reset_password_handler,
    scan_qr_handler, session_handler, session_status_handler, update_alias_handler,
    update_expiration_handler, validate_alias_handler, verify_email_handler,
    verify_reset_pin_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All API routes, mounted under `/api`.
///
/// # Endpoints
///
/// - `POST   /session`                     - Issue an anonymous session ID
/// - `POST   /links`                       - Create a short link
/// - `GET    /links`                       - List the session's links
/// - `DELETE /links`                       - Delete one link (query) or many (body)
/// - `PUT    /links`                       - Replace a link's alias
/// - `PATCH  /links`                       - Replace a link's expiration policy
/// - `GET    /links/validate`              - Alias availability
/// - `GET    /click/{slug}`                - Record a click, return the destination
/// - `GET    /analytics`                   - Session dashboard statistics
/// - `POST   /bulk`                        - Bulk import
/// - `GET    /metadata`                    - Open-graph preview of a URL
/// - `POST   /qr`                          - Store a QR target
/// - `GET    /qr/scan/{uuid}`              - Count a scan and redirect
/// - `POST   /user/register`               - Register an account
/// - `GET    /user/verify`                 - Confirm an email address
/// - `POST   /user/login`                  - Sign in, set the session cookie
/// - `POST   /user/request-password-reset` - Email a reset PIN
/// - `POST   /user/verify-reset-pin`       - Check a reset PIN
/// - `POST   /user/reset-password`         - Set a new password
/// - `POST   /auth/logout`                 - Clear the session cookie
/// - `GET    /auth/verify`                 - Current signed-in user
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/session", post(session_handler))
        .route(
            "/links",
            get(list_links_handler)
                .post(create_link_handler)
                .delete(delete_links_handler)
                .put(update_alias_handler)
                .patch(update_expiration_handler),
        )
        .route("/links/validate", get(validate_alias_handler))
        .route("/click/{slug}", get(click_handler))
        .route("/analytics", get(analytics_handler))
        .route("/bulk", post(bulk_create_handler))
        .route("/metadata", get(metadata_handler))
        .route("/qr", post(create_qr_handler))
        .route("/qr/scan/{uuid}", get(scan_qr_handler))
        .merge(user_routes())
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register_handler))
        .route("/user/verify", get(verify_email_handler))
        .route("/user/login", post(login_handler))
        .route(
            "/user/request-password-reset",
            post(request_password_reset_handler),
        )
        .route("/user/verify-reset-pin", post(verify_reset_pin_handler))
        .route("/user/reset-password", post(reset_password_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/verify", get(session_status_handler))
}
