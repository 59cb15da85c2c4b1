//! Click recording on short link resolution.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use super::GeoService;
use crate::domain::entities::{ExpirationPolicy, Link, NewClick};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::url_validator::{domain_authority, parse_custom_domain};
use crate::utils::user_agent::{classify_device, visitor_fingerprint};

/// User agent recorded when the request carries none.
const UNKNOWN_USER_AGENT: &str = "unknown";

/// Request metadata captured for a click.
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

fn not_found(code: &str) -> AppError {
    metrics::counter!("linkly_clicks_rejected_total", "reason" => "not_found").increment(1);
    AppError::not_found("Link not found", json!({ "code": code }))
}

fn gone(code: &str) -> AppError {
    metrics::counter!("linkly_clicks_rejected_total", "reason" => "expired").increment(1);
    AppError::gone("Link expired", json!({ "code": code }))
}

/// Resolves short codes and records visits.
///
/// The expiration gate runs twice: once against the loaded record, and again
/// inside the store's guarded increment, so concurrent clicks racing past
/// the first check still cannot overshoot a click bound.
pub struct ClickService<R: LinkRepository + ?Sized> {
    repository: Arc<R>,
    geo: Arc<GeoService>,
    platform_domain: String,
    platform_authority: Option<String>,
}

impl<R: LinkRepository + ?Sized> ClickService<R> {
    /// `platform_domain` is the base URL links are created on by default.
    pub fn new(repository: Arc<R>, geo: Arc<GeoService>, platform_domain: &str) -> Self {
        let platform_domain = platform_domain.trim_end_matches('/').to_string();
        Self {
            platform_authority: domain_authority(&platform_domain),
            platform_domain,
            repository,
            geo,
        }
    }

    /// Records a click on `code` and returns the destination URL.
    ///
    /// Geolocation and user-agent parsing degrade to defaults and never block
    /// the click.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link uses the code.
    /// Returns [`AppError::Gone`] if the link is expired; the click is not recorded.
    pub async fn record(&self, code: &str, ctx: ClickContext) -> Result<String, AppError> {
        let link = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| not_found(code))?;

        self.record_visit(link, code, ctx).await
    }

    /// Records a click that arrived on `host`, the request's `Host` header.
    ///
    /// A link on a branded domain resolves on that domain and on the platform
    /// host only; platform links resolve on any host.
    ///
    /// # Errors
    ///
    /// Same as [`Self::record`]; a branded link requested on a foreign host is
    /// [`AppError::NotFound`].
    pub async fn record_on_host(
        &self,
        host: &str,
        code: &str,
        ctx: ClickContext,
    ) -> Result<String, AppError> {
        let link = self
            .repository
            .find_by_code(code)
            .await?
            .filter(|link| self.served_on(link, host))
            .ok_or_else(|| not_found(code))?;

        self.record_visit(link, code, ctx).await
    }

    fn served_on(&self, link: &Link, host: &str) -> bool {
        if link.domain == self.platform_domain {
            return true;
        }
        let Ok(host) = parse_custom_domain(host) else {
            return false;
        };
        self.platform_authority.as_deref() == Some(host.as_str())
            || domain_authority(&link.domain).as_deref() == Some(host.as_str())
    }

    async fn record_visit(
        &self,
        link: Link,
        code: &str,
        ctx: ClickContext,
    ) -> Result<String, AppError> {
        if link.is_expired_at(Utc::now()) {
            return Err(gone(code));
        }

        let user_agent = ctx
            .user_agent
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_USER_AGENT.to_string());
        let device_type = classify_device(&user_agent);
        let country_code = self.geo.country_for(ctx.ip).await;
        let ip = ctx.ip.map(|ip| ip.to_string());
        let visitor_hash = visitor_fingerprint(ip.as_deref().unwrap_or_default(), &user_agent);

        let click = NewClick {
            link_id: link.id,
            ip,
            user_agent: Some(user_agent),
            device_type,
            country_code,
            visitor_hash,
        };

        let Some(updated) = self.repository.record_click(click, Utc::now()).await? else {
            return Err(gone(code));
        };

        if let ExpirationPolicy::Clicks(limit) = updated.expiration
            && updated.total_clicks >= limit
        {
            // Reads recompute the policy, so a failed flip only delays the cached status.
            match self.repository.mark_expired(updated.id).await {
                Ok(_) => {
                    tracing::info!(link_id = updated.id, limit, "Click limit reached, link expired")
                }
                Err(e) => tracing::warn!(
                    link_id = updated.id,
                    error = %e,
                    "Failed to mark link expired after final click"
                ),
            }
        }

        metrics::counter!("linkly_clicks_recorded_total").increment(1);
        tracing::debug!(
            link_id = updated.id,
            device = device_type.as_str(),
            total_clicks = updated.total_clicks,
            "Click recorded"
        );

        Ok(updated.original_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DeviceType, Link, LinkSource, LinkStatus};
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::NullCache;
    use crate::infrastructure::geo::MockGeoLocator;
    use chrono::Duration;

    const PLATFORM: &str = "http://localhost:3000";
    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

    fn link(total_clicks: i64, expiration: ExpirationPolicy, status: LinkStatus) -> Link {
        Link {
            id: 1,
            original_url: "https://example.com/landing".to_string(),
            short_code: "abcd1234".to_string(),
            full_short_url: "http://localhost:3000/abcd1234".to_string(),
            custom_alias: None,
            session_id: "s1".to_string(),
            domain: "http://localhost:3000".to_string(),
            total_clicks,
            expiration,
            status,
            source: LinkSource::Single,
            bulk_batch_id: None,
            created_at: Utc::now(),
        }
    }

    fn geo(country: Option<&'static str>) -> Arc<GeoService> {
        let mut locator = MockGeoLocator::new();
        locator
            .expect_lookup()
            .returning(move |_| Ok(country.map(str::to_string)));
        Arc::new(GeoService::new(
            Arc::new(locator),
            Arc::new(NullCache::new()),
            60,
        ))
    }

    #[tokio::test]
    async fn test_record_click_success() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|_| Ok(Some(link(0, ExpirationPolicy::None, LinkStatus::Active))));
        repo.expect_record_click()
            .withf(|click, _| {
                click.link_id == 1
                    && click.device_type == DeviceType::Mobile
                    && click.country_code == "FR"
                    && click.ip.as_deref() == Some("203.0.113.7")
                    && click.visitor_hash.len() == 64
            })
            .times(1)
            .returning(|_, _| Ok(Some(link(1, ExpirationPolicy::None, LinkStatus::Active))));
        repo.expect_mark_expired().never();

        let service = ClickService::new(Arc::new(repo), geo(Some("FR")), PLATFORM);
        let destination = service
            .record(
                "abcd1234",
                ClickContext {
                    ip: Some("203.0.113.7".parse().unwrap()),
                    user_agent: Some(IPHONE.to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(destination, "https://example.com/landing");
    }

    #[tokio::test]
    async fn test_missing_metadata_uses_defaults() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|_| Ok(Some(link(0, ExpirationPolicy::None, LinkStatus::Active))));
        repo.expect_record_click()
            .withf(|click, _| {
                click.user_agent.as_deref() == Some(UNKNOWN_USER_AGENT)
                    && click.country_code == "Unknown"
                    && click.ip.is_none()
                    && click.visitor_hash == visitor_fingerprint("", UNKNOWN_USER_AGENT)
            })
            .returning(|_, _| Ok(Some(link(1, ExpirationPolicy::None, LinkStatus::Active))));

        let service = ClickService::new(Arc::new(repo), geo(None), PLATFORM);
        assert!(service.record("abcd1234", ClickContext::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_code() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));
        repo.expect_record_click().never();

        let service = ClickService::new(Arc::new(repo), geo(None), PLATFORM);
        let err = service
            .record("missing", ClickContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_expired_link_is_not_recorded() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| {
            Ok(Some(link(
                0,
                ExpirationPolicy::DateTime(Utc::now() - Duration::minutes(5)),
                LinkStatus::Active,
            )))
        });
        repo.expect_record_click().never();

        let service = ClickService::new(Arc::new(repo), geo(None), PLATFORM);
        let err = service
            .record("abcd1234", ClickContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Gone { .. }));
    }

    #[tokio::test]
    async fn test_cached_expired_flag_wins() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|_| Ok(Some(link(0, ExpirationPolicy::None, LinkStatus::Expired))));
        repo.expect_record_click().never();

        let service = ClickService::new(Arc::new(repo), geo(None), PLATFORM);
        assert!(matches!(
            service.record("abcd1234", ClickContext::default()).await,
            Err(AppError::Gone { .. })
        ));
    }

    #[tokio::test]
    async fn test_last_allowed_click_flips_status() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| {
            Ok(Some(link(1, ExpirationPolicy::Clicks(2), LinkStatus::Active)))
        });
        repo.expect_record_click()
            .returning(|_, _| Ok(Some(link(2, ExpirationPolicy::Clicks(2), LinkStatus::Active))));
        repo.expect_mark_expired()
            .withf(|id| *id == 1)
            .times(1)
            .returning(|_| Ok(true));

        let service = ClickService::new(Arc::new(repo), geo(None), PLATFORM);
        assert!(service.record("abcd1234", ClickContext::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_status_flip_failure_still_redirects() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| {
            Ok(Some(link(0, ExpirationPolicy::Clicks(1), LinkStatus::Active)))
        });
        repo.expect_record_click()
            .times(1)
            .returning(|_, _| Ok(Some(link(1, ExpirationPolicy::Clicks(1), LinkStatus::Active))));
        repo.expect_mark_expired()
            .times(1)
            .returning(|_| Err(AppError::internal("db down", json!({}))));

        let service = ClickService::new(Arc::new(repo), geo(None), PLATFORM);
        let destination = service
            .record("abcd1234", ClickContext::default())
            .await
            .unwrap();

        assert_eq!(destination, "https://example.com/landing");
    }

    fn branded(domain: &str) -> Link {
        let mut link = link(0, ExpirationPolicy::None, LinkStatus::Active);
        link.domain = domain.to_string();
        link.full_short_url = format!("{domain}/abcd1234");
        link
    }

    #[tokio::test]
    async fn test_branded_link_resolves_on_its_host() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|_| Ok(Some(branded("http://go.brand.test"))));
        repo.expect_record_click()
            .times(3)
            .returning(|_, _| Ok(Some(branded("http://go.brand.test"))));

        let service = ClickService::new(Arc::new(repo), geo(None), PLATFORM);

        for host in ["go.brand.test", "GO.Brand.test:80", "localhost:3000"] {
            let destination = service
                .record_on_host(host, "abcd1234", ClickContext::default())
                .await
                .unwrap();
            assert_eq!(destination, "https://example.com/landing");
        }
    }

    #[tokio::test]
    async fn test_branded_link_is_absent_on_foreign_host() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|_| Ok(Some(branded("http://go.brand.test"))));
        repo.expect_record_click().never();

        let service = ClickService::new(Arc::new(repo), geo(None), PLATFORM);
        let err = service
            .record_on_host("other.test", "abcd1234", ClickContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_platform_link_resolves_on_any_host() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|_| Ok(Some(link(0, ExpirationPolicy::None, LinkStatus::Active))));
        repo.expect_record_click()
            .times(1)
            .returning(|_, _| Ok(Some(link(1, ExpirationPolicy::None, LinkStatus::Active))));

        let service = ClickService::new(Arc::new(repo), geo(None), PLATFORM);
        assert!(service
            .record_on_host("127.0.0.1:3000", "abcd1234", ClickContext::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_guard_rejection_maps_to_gone() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| {
            Ok(Some(link(0, ExpirationPolicy::Clicks(1), LinkStatus::Active)))
        });
        repo.expect_record_click().returning(|_, _| Ok(None));
        repo.expect_mark_expired().never();

        let service = ClickService::new(Arc::new(repo), geo(None), PLATFORM);
        assert!(matches!(
            service.record("abcd1234", ClickContext::default()).await,
            Err(AppError::Gone { .. })
        ));
    }
}
