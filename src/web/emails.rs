//! Transactional email bodies.
//!
//! Each message is rendered twice, as plain text and HTML, and delivered as
//! a multipart alternative by the mailer.

use askama::Template;
use serde_json::json;

use crate::error::AppError;
use crate::infrastructure::mail::OutgoingMail;

#[derive(Template)]
#[template(path = "email/verify.html")]
struct VerifyHtml<'a> {
    first_name: &'a str,
    verify_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/verify.txt")]
struct VerifyText<'a> {
    first_name: &'a str,
    verify_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/reset_pin.html")]
struct ResetPinHtml<'a> {
    first_name: &'a str,
    pin: &'a str,
    valid_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/reset_pin.txt")]
struct ResetPinText<'a> {
    first_name: &'a str,
    pin: &'a str,
    valid_minutes: i64,
}

fn render_failed(e: askama::Error) -> AppError {
    tracing::error!(error = %e, "Email template rendering failed");
    AppError::internal("Failed to render email", json!({}))
}

pub fn verification_mail(
    to: &str,
    first_name: &str,
    verify_url: &str,
) -> Result<OutgoingMail, AppError> {
    Ok(OutgoingMail {
        to: to.to_string(),
        subject: "Verify your email".to_string(),
        text_body: VerifyText {
            first_name,
            verify_url,
        }
        .render()
        .map_err(render_failed)?,
        html_body: VerifyHtml {
            first_name,
            verify_url,
        }
        .render()
        .map_err(render_failed)?,
    })
}

pub fn reset_pin_mail(
    to: &str,
    first_name: &str,
    pin: &str,
    valid_minutes: i64,
) -> Result<OutgoingMail, AppError> {
    Ok(OutgoingMail {
        to: to.to_string(),
        subject: "Password reset code".to_string(),
        text_body: ResetPinText {
            first_name,
            pin,
            valid_minutes,
        }
        .render()
        .map_err(render_failed)?,
        html_body: ResetPinHtml {
            first_name,
            pin,
            valid_minutes,
        }
        .render()
        .map_err(render_failed)?,
    })
}
