//! Handlers for account registration, login and password reset.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use crate::api::dto::user::{
    LoginRequest, LoginResponse, MessageResponse, PasswordResetRequest, RegisterRequest,
    ResetPasswordRequest, SessionStatus, UserView, VerifyEmailQuery, VerifyResetPinRequest,
};
use crate::api::middleware::session::{AuthUser, cleared_session_cookie, session_cookie};
use crate::error::AppError;
use crate::state::AppState;
use crate::web::pages::VerifiedPage;

/// Registers an unverified account and emails a verification link.
///
/// # Endpoint
///
/// `POST /api/user/register`
///
/// # Request Body
///
/// ```json
/// { "firstName": "Ada", "email": "ada@example.com", "password": "..." }
/// ```
///
/// # Errors
///
/// - 400 if validation fails
/// - 409 if the email is already registered
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    payload.validate()?;

    state.user_service.register(payload.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("Verification email sent")),
    ))
}

/// Confirms an email address from the link in the verification email.
///
/// `GET /api/user/verify?token=...&email=...`
pub async fn verify_email_handler(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<VerifiedPage, AppError> {
    let user = state
        .user_service
        .verify_email(&query.email, &query.token)
        .await?;

    Ok(VerifiedPage {
        first_name: user.first_name,
        login_url: format!("{}/login", state.settings.base_url),
    })
}

/// Checks credentials and sets the HTTP-only `token` session cookie.
///
/// `POST /api/user/login`
///
/// # Errors
///
/// - 401 for unknown email or wrong password
/// - 403 if the account is not verified yet
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let session = state
        .user_service
        .login(&payload.email, &payload.password)
        .await?;

    let cookie = session_cookie(
        session.token,
        state.user_service.session_ttl(),
        state.settings.cookie_secure,
    );

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful",
            user: UserView::from(&session.user),
        }),
    ))
}

/// `POST /api/auth/logout`
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(cleared_session_cookie(state.settings.cookie_secure)),
        Json(MessageResponse::ok("Logout successful")),
    )
}

/// Reports the signed-in user.
///
/// `GET /api/auth/verify` answers `{"valid": true, "user": {...}}`, or 401
/// when the cookie is missing or invalid.
pub async fn session_status_handler(AuthUser(user): AuthUser) -> Json<SessionStatus> {
    Json(SessionStatus {
        valid: true,
        user: Some(UserView::from(&user)),
    })
}

/// Emails a six-digit reset PIN valid for one hour.
///
/// `POST /api/user/request-password-reset`
pub async fn request_password_reset_handler(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;

    state
        .user_service
        .request_password_reset(&payload.email)
        .await?;

    Ok(Json(MessageResponse::ok("Reset code sent")))
}

/// `POST /api/user/verify-reset-pin`
pub async fn verify_reset_pin_handler(
    State(state): State<AppState>,
    Json(payload): Json<VerifyResetPinRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .user_service
        .verify_reset_pin(&payload.email, &payload.reset_pin)
        .await?;

    Ok(Json(MessageResponse::ok("Code verified")))
}

/// Sets a new password and consumes the PIN.
///
/// `POST /api/user/reset-password`
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;

    state
        .user_service
        .reset_password(&payload.email, &payload.reset_pin, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse::ok("Password updated successfully")))
}
