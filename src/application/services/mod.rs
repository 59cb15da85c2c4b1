//! Business logic services for the application layer.

pub mod analytics_service;
pub mod click_service;
pub mod geo_service;
pub mod link_service;
pub mod qr_service;
pub mod user_service;

pub use analytics_service::AnalyticsService;
pub use click_service::{ClickContext, ClickService};
pub use geo_service::GeoService;
pub use link_service::{
    AliasAvailability, BulkItem, BulkOutcome, CreateLink, ExpirationUpdate, LinkService,
};
pub use qr_service::{CreateQr, QrService};
pub use user_service::{LoginSession, Registration, UserService};
