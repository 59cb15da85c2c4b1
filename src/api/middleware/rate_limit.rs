//! Rate limiting middleware using token bucket algorithm.
//!
//! # Limits
//!
//! - **Rate**: 2 requests per second
//! - **Burst**: 100 requests
//!
//! Requests exceeding the limit receive `429 Too Many Requests`.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor},
};

const PER_SECOND: u64 = 2;
const BURST_SIZE: u32 = 100;

/// Per-IP limiter keyed on the socket peer address.
///
/// Requires the server to be started with
/// `into_make_service_with_connect_info::<SocketAddr>`.
pub fn layer() -> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>
{
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(PER_SECOND)
            .burst_size(BURST_SIZE)
            .finish()
            .expect("non-zero rate limit"),
    );

    GovernorLayer::new(governor_conf)
}

/// Per-IP limiter for deployments behind a trusted reverse proxy.
///
/// The key is taken from `X-Forwarded-For`, `X-Real-IP` or `Forwarded`,
/// falling back to the peer address.
pub fn proxy_layer()
-> GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(PER_SECOND)
            .burst_size(BURST_SIZE)
            .finish()
            .expect("non-zero rate limit"),
    );

    GovernorLayer::new(governor_conf)
}
