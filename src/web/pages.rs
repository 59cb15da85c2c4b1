//! Browser-facing pages.

use askama::Template;
use askama_web::WebTemplate;

/// Shown with `410 Gone` when a short link has expired.
#[derive(Template, WebTemplate)]
#[template(path = "expired.html")]
pub struct ExpiredPage {
    pub code: String,
    pub home_url: String,
}

/// Shown with `404 Not Found` for an unknown short code.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    pub code: String,
    pub home_url: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "verified.html")]
pub struct VerifiedPage {
    pub first_name: String,
    pub login_url: String,
}
