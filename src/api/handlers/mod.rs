//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod analytics;
pub mod bulk;
pub mod click;
pub mod health;
pub mod links;
pub mod metadata;
pub mod qr;
pub mod redirect;
pub mod user;

pub use analytics::analytics_handler;
pub use bulk::bulk_create_handler;
pub use click::{click_handler, session_handler};
pub use health::health_handler;
pub use links::{
    create_link_handler, delete_links_handler, list_links_handler, update_alias_handler,
    update_expiration_handler, validate_alias_handler,
};
pub use metadata::metadata_handler;
pub use qr::{create_qr_handler, scan_qr_handler};
pub use redirect::redirect_handler;
pub use user::{
    login_handler, logout_handler, register_handler, request_password_reset_handler,
    reset_password_handler, session_status_handler, verify_email_handler,
    verify_reset_pin_handler,
};
