//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented in `crate::infrastructure::persistence` (PostgreSQL) and
//! `crate::infrastructure::memory` (process-local). Mock implementations are
//! generated via `mockall` for service tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Links, click recording and session activity
//! - [`UserRepository`] - Accounts and one-time secrets
//! - [`QrRepository`] - QR records and scan counters

pub mod link_repository;
pub mod qr_repository;
pub mod user_repository;

pub use link_repository::{LinkRepository, LinkTotals};
pub use qr_repository::QrRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use qr_repository::MockQrRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
