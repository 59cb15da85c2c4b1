//! HTTP middleware and request extractors.
//!
//! Provides rate limiting, observability, caller IP resolution and the
//! session cookie principal.

pub mod client_ip;
pub mod rate_limit;
pub mod session;
pub mod tracing;
