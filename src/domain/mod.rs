//! Domain layer containing business entities and logic.
//!
//! Everything here is independent of storage and transport:
//!
//! - [`entities`] - Core business data structures
//! - [`expiration`] - Expiration policy evaluation (cached flag OR live recompute)
//! - [`analytics`] - Pure aggregation of click history into dashboard statistics
//! - [`repositories`] - Data access trait definitions
//!
//! Repository traits define contracts implemented by the infrastructure layer;
//! business workflows live in [`crate::application::services`].

pub mod analytics;
pub mod entities;
pub mod expiration;
pub mod repositories;
