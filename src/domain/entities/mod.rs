//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Link`] - A shortened URL with its expiration policy and counters
//! - [`Click`] - One recorded visit of a link
//! - [`User`] - A registered account
//! - [`QrCode`] - A standalone QR target
//!
//! Entities follow the "New Type" pattern with separate structs for creation
//! (`NewLink`, `NewClick`, `NewUser`, `NewQrCode`).

pub mod click;
pub mod link;
pub mod qr;
pub mod user;

pub use click::{Click, DeviceType, NewClick};
pub use link::{ExpirationPolicy, ExpirationType, Link, LinkSource, LinkStatus, NewLink};
pub use qr::{NewQrCode, QrCode};
pub use user::{NewUser, User};
