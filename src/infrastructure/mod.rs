//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence, caching and outbound calls.
//!
//! # Modules
//!
//! - [`cache`] - Caching abstractions (Redis and no-op implementations)
//! - [`geo`] - IP to country lookup
//! - [`mail`] - SMTP and log-only mailers
//! - [`memory`] - Process-local repositories
//! - [`metadata`] - Open-graph metadata fetcher
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod geo;
pub mod mail;
pub mod memory;
pub mod metadata;
pub mod persistence;
