//! Server-rendered HTML.
//!
//! Uses Askama templates from `templates/`.
//!
//! # Modules
//!
//! - [`pages`] - Redirect outcome pages and the email-verified page
//! - [`emails`] - Verification and password reset message bodies

pub mod emails;
pub mod pages;
