//! HTTP server initialization and runtime setup.
//!
//! Handles storage selection, migrations, cache setup, outbound integrations
//! and the Axum server lifecycle.

use crate::config::{Config, StorageBackend};
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::geo::{DisabledGeoLocator, GeoLocator, HttpGeoLocator};
use crate::infrastructure::mail::{LogMailer, Mailer, SmtpMailer};
use crate::infrastructure::metadata::HttpMetadataFetcher;
use crate::routes::app_router;
use crate::state::{AppState, Integrations, Repositories};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Opens a PostgreSQL pool sized by the `DB_*` settings.
pub async fn connect_pool(config: &Config, database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    Ok(pool)
}

async fn build_repositories(config: &Config) -> Result<Repositories> {
    match (config.storage_backend, config.database_url.as_deref()) {
        (StorageBackend::Postgres, Some(database_url)) => {
            let pool = connect_pool(config, database_url).await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Migrations applied");

            Ok(Repositories::postgres(Arc::new(pool)))
        }
        (StorageBackend::Postgres, None) => {
            anyhow::bail!("DATABASE_URL is required for the postgres backend")
        }
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Repositories::in_memory())
        }
    }
}

async fn build_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

fn build_geo(config: &Config) -> Result<Arc<dyn GeoLocator>> {
    match &config.geoip_api_url {
        Some(template) => {
            let locator = HttpGeoLocator::new(
                template.clone(),
                Duration::from_millis(config.geoip_timeout_ms),
            )
            .context("Failed to build geolocation client")?;
            Ok(Arc::new(locator))
        }
        None => {
            tracing::info!("Geolocation disabled, countries recorded as Unknown");
            Ok(Arc::new(DisabledGeoLocator))
        }
    }
}

fn build_mailer(config: &Config) -> Result<Arc<dyn Mailer>> {
    match &config.smtp {
        Some(smtp) => {
            let mailer = SmtpMailer::new(smtp, &config.mail_from)
                .context("Failed to configure SMTP transport")?;
            Ok(Arc::new(mailer))
        }
        None => {
            tracing::warn!("SMTP not configured, emails are logged instead of sent");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Builds the application state for `config`.
///
/// # Errors
///
/// Returns an error if the database is unreachable, migrations fail, or an
/// outbound client cannot be constructed.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let repositories = build_repositories(config).await?;

    let metadata = HttpMetadataFetcher::new(Duration::from_secs(config.metadata_timeout_secs))
        .context("Failed to build metadata client")?;

    let integrations = Integrations {
        cache: build_cache(config).await,
        geo: build_geo(config)?,
        mailer: build_mailer(config)?,
        metadata: Arc::new(metadata),
    };

    Ok(AppState::new(config, repositories, integrations))
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Storage backend (PostgreSQL with migrations, or in-memory)
/// - Redis cache (or NullCache fallback)
/// - Geolocation, mail and metadata clients
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migrations fail
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config).await?;
    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
