//! Shared application state injected into every handler.

use std::sync::Arc;

use sqlx::PgPool;

use crate::application::services::{
    AnalyticsService, ClickService, GeoService, LinkService, QrService, UserService,
};
use crate::config::Config;
use crate::domain::repositories::{LinkRepository, QrRepository, UserRepository};
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::geo::GeoLocator;
use crate::infrastructure::mail::Mailer;
use crate::infrastructure::memory::{
    InMemoryLinkRepository, InMemoryQrRepository, InMemoryUserRepository,
};
use crate::infrastructure::metadata::MetadataFetcher;
use crate::infrastructure::persistence::{PgLinkRepository, PgQrRepository, PgUserRepository};

/// Storage handles for one backend.
#[derive(Clone)]
pub struct Repositories {
    pub links: Arc<dyn LinkRepository>,
    pub users: Arc<dyn UserRepository>,
    pub qr_codes: Arc<dyn QrRepository>,
}

impl Repositories {
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            links: Arc::new(PgLinkRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            qr_codes: Arc::new(PgQrRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            links: Arc::new(InMemoryLinkRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            qr_codes: Arc::new(InMemoryQrRepository::new()),
        }
    }
}

/// Outbound collaborators. Each one degrades instead of failing requests.
#[derive(Clone)]
pub struct Integrations {
    pub cache: Arc<dyn CacheService>,
    pub geo: Arc<dyn GeoLocator>,
    pub mailer: Arc<dyn Mailer>,
    pub metadata: Arc<dyn MetadataFetcher>,
}

/// HTTP-level settings read by handlers and middleware.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub base_url: String,
    pub behind_proxy: bool,
    pub cookie_secure: bool,
    pub rate_limit_enabled: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub click_service: Arc<ClickService<dyn LinkRepository>>,
    pub analytics_service: Arc<AnalyticsService<dyn LinkRepository>>,
    pub user_service: Arc<UserService<dyn UserRepository>>,
    pub qr_service: Arc<QrService<dyn QrRepository>>,
    pub metadata: Arc<dyn MetadataFetcher>,
    pub cache: Arc<dyn CacheService>,
    pub settings: HttpSettings,
}

impl AppState {
    /// Wires services over the given storage and integrations.
    pub fn new(config: &Config, repositories: Repositories, integrations: Integrations) -> Self {
        let Repositories {
            links,
            users,
            qr_codes,
        } = repositories;

        let geo = Arc::new(GeoService::new(
            integrations.geo,
            integrations.cache.clone(),
            config.cache_ttl_seconds,
        ));

        Self {
            link_service: Arc::new(LinkService::new(
                links.clone(),
                config.base_url.clone(),
                config.bulk_max_urls,
            )),
            click_service: Arc::new(ClickService::new(links.clone(), geo, &config.base_url)),
            analytics_service: Arc::new(AnalyticsService::new(links)),
            user_service: Arc::new(UserService::new(
                users,
                integrations.mailer,
                config.jwt_secret.clone(),
                config.session_ttl_hours,
                config.base_url.clone(),
            )),
            qr_service: Arc::new(QrService::new(qr_codes, config.base_url.clone())),
            metadata: integrations.metadata,
            cache: integrations.cache,
            settings: HttpSettings {
                base_url: config.base_url.clone(),
                behind_proxy: config.behind_proxy,
                cookie_secure: config.cookie_secure,
                rate_limit_enabled: config.rate_limit_enabled,
            },
        }
    }
}
