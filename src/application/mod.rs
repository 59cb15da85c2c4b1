//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link creation, ownership-scoped management, bulk import
//! - [`services::click_service::ClickService`] - Click recording behind the expiration gate
//! - [`services::analytics_service::AnalyticsService`] - Session dashboards
//! - [`services::user_service::UserService`] - Accounts, sessions and password reset
//! - [`services::qr_service::QrService`] - QR targets and scans

pub mod services;
