//! Best-effort caller geolocation with a per-IP cache.

use std::net::IpAddr;
use std::sync::Arc;

use crate::infrastructure::cache::CacheService;
use crate::infrastructure::geo::GeoLocator;

/// Country code recorded when the caller cannot be located.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Resolves caller IPs to country codes.
///
/// Never fails: lookup errors, timeouts and loopback callers all yield
/// [`UNKNOWN_COUNTRY`]. Only successful answers are cached.
pub struct GeoService {
    locator: Arc<dyn GeoLocator>,
    cache: Arc<dyn CacheService>,
    cache_ttl_seconds: u64,
}

impl GeoService {
    pub fn new(
        locator: Arc<dyn GeoLocator>,
        cache: Arc<dyn CacheService>,
        cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            locator,
            cache,
            cache_ttl_seconds,
        }
    }

    pub async fn country_for(&self, ip: Option<IpAddr>) -> String {
        let Some(ip) = ip else {
            return UNKNOWN_COUNTRY.to_string();
        };
        let ip = ip.to_canonical();
        if ip.is_loopback() || ip.is_unspecified() {
            return UNKNOWN_COUNTRY.to_string();
        }

        let key = format!("geo:{ip}");
        match self.cache.get(&key).await {
            Ok(Some(country)) => return country,
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Geo cache read failed"),
        }

        match self.locator.lookup(ip).await {
            Ok(Some(country)) => {
                if let Err(e) = self
                    .cache
                    .set(&key, &country, Some(self.cache_ttl_seconds))
                    .await
                {
                    tracing::warn!(error = %e, "Geo cache write failed");
                }
                country
            }
            Ok(None) => UNKNOWN_COUNTRY.to_string(),
            Err(e) => {
                tracing::warn!(ip = %ip, error = %e, "Geolocation lookup failed");
                UNKNOWN_COUNTRY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::{CacheError, CacheResult, NullCache};
    use crate::infrastructure::geo::{GeoError, MockGeoLocator};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapCache(Mutex<HashMap<String, String>>);

    #[async_trait]
    impl CacheService for MapCache {
        async fn get(&self, key: &str) -> CacheResult<Option<String>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str, _ttl: Option<u64>) -> CacheResult<()> {
            self.0
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl CacheService for BrokenCache {
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            Err(CacheError::OperationError("connection reset".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Option<u64>) -> CacheResult<()> {
            Err(CacheError::OperationError("connection reset".to_string()))
        }

        async fn health_check(&self) -> bool {
            false
        }
    }

    fn ip(s: &str) -> Option<IpAddr> {
        Some(s.parse().unwrap())
    }

    #[tokio::test]
    async fn test_loopback_and_missing_skip_lookup() {
        let mut locator = MockGeoLocator::new();
        locator.expect_lookup().never();
        let service = GeoService::new(Arc::new(locator), Arc::new(NullCache::new()), 60);

        assert_eq!(service.country_for(None).await, UNKNOWN_COUNTRY);
        assert_eq!(service.country_for(ip("127.0.0.1")).await, UNKNOWN_COUNTRY);
        assert_eq!(service.country_for(ip("::1")).await, UNKNOWN_COUNTRY);
        assert_eq!(service.country_for(ip("::ffff:127.0.0.1")).await, UNKNOWN_COUNTRY);
    }

    #[tokio::test]
    async fn test_cache_errors_fall_through_to_lookup() {
        let mut locator = MockGeoLocator::new();
        locator
            .expect_lookup()
            .times(2)
            .returning(|_| Ok(Some("JP".to_string())));
        let service = GeoService::new(Arc::new(locator), Arc::new(BrokenCache), 60);

        assert_eq!(service.country_for(ip("203.0.113.20")).await, "JP");
        assert_eq!(service.country_for(ip("203.0.113.20")).await, "JP");
    }

    #[tokio::test]
    async fn test_lookup_result_is_cached() {
        let mut locator = MockGeoLocator::new();
        locator
            .expect_lookup()
            .times(1)
            .returning(|_| Ok(Some("DE".to_string())));
        let service = GeoService::new(Arc::new(locator), Arc::new(MapCache::default()), 60);

        assert_eq!(service.country_for(ip("203.0.113.9")).await, "DE");
        assert_eq!(service.country_for(ip("203.0.113.9")).await, "DE");
    }

    #[tokio::test]
    async fn test_failure_degrades_to_unknown() {
        let mut locator = MockGeoLocator::new();
        locator
            .expect_lookup()
            .returning(|_| Err(GeoError::Status(reqwest::StatusCode::TOO_MANY_REQUESTS)));
        let service = GeoService::new(Arc::new(locator), Arc::new(MapCache::default()), 60);

        assert_eq!(service.country_for(ip("198.51.100.1")).await, UNKNOWN_COUNTRY);
    }
}
