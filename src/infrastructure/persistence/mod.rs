//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `FromRow` row structs.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Links, guarded click recording and session activity
//! - [`PgUserRepository`] - Accounts and hashed one-time secrets
//! - [`PgQrRepository`] - QR records and scan counters

pub mod pg_link_repository;
pub mod pg_qr_repository;
pub mod pg_user_repository;

pub use pg_link_repository::PgLinkRepository;
pub use pg_qr_repository::PgQrRepository;
pub use pg_user_repository::PgUserRepository;
