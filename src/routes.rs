//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`      - Short link redirect (public)
//! - `GET  /health`      - Health check: store and cache (public)
//! - `/api/*`            - REST API
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on `/api` (configurable for proxy deployments)
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// Rate limiting follows `state.settings`: skipped when disabled, keyed on
/// forwarding headers when `behind_proxy` is set, and on the socket peer
/// address otherwise. The peer-keyed limiter needs the server to provide
/// `ConnectInfo<SocketAddr>`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Routes and layers without path normalization.
pub fn router(state: AppState) -> Router {
    let settings = state.settings.clone();

    let mut api_router = api::routes::api_routes();
    if settings.rate_limit_enabled {
        api_router = if settings.behind_proxy {
            api_router.layer(rate_limit::proxy_layer())
        } else {
            api_router.layer(rate_limit::layer())
        };
    }

    Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer())
}
