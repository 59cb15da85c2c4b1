#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use linkly::config::{Config, StorageBackend};
use linkly::infrastructure::cache::NullCache;
use linkly::infrastructure::geo::{GeoError, GeoLocator};
use linkly::infrastructure::mail::{MailError, Mailer, OutgoingMail};
use linkly::infrastructure::metadata::{ImageRef, LinkMetadata, MetadataFetcher, MetadataResult};
use linkly::routes::router;
use linkly::state::{AppState, Integrations, Repositories};
use serde_json::{Value, json};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use url::Url;

pub const BASE_URL: &str = "http://lnk.test";

pub const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
pub const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub fn test_config() -> Config {
    Config {
        storage_backend: StorageBackend::Memory,
        database_url: None,
        redis_url: None,
        listen_addr: "127.0.0.1:0".to_string(),
        base_url: BASE_URL.to_string(),
        log_level: "warn".to_string(),
        log_format: "text".to_string(),
        // Tests pick the caller IP through X-Forwarded-For.
        behind_proxy: true,
        rate_limit_enabled: false,
        cache_ttl_seconds: 60,
        jwt_secret: "integration-test-secret".to_string(),
        session_ttl_hours: 48,
        cookie_secure: false,
        geoip_api_url: None,
        geoip_timeout_ms: 500,
        metadata_timeout_secs: 1,
        bulk_max_urls: 5,
        smtp: None,
        mail_from: "noreply@lnk.test".to_string(),
        db_max_connections: 1,
        db_connect_timeout: 1,
        db_idle_timeout: 60,
        db_max_lifetime: 60,
    }
}

/// Maps 10.0.0.x to DE and everything else to US.
pub struct StubGeoLocator;

#[async_trait]
impl GeoLocator for StubGeoLocator {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<String>, GeoError> {
        let country = match ip {
            IpAddr::V4(v4) if v4.octets()[..3] == [10, 0, 0] => "DE",
            _ => "US",
        };
        Ok(Some(country.to_string()))
    }
}

/// Keeps every message instead of sending it.
#[derive(Clone, Default)]
pub struct CapturingMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl CapturingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_to(&self, email: &str) -> OutgoingMail {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.to == email)
            .unwrap_or_else(|| panic!("no mail sent to {email}"))
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

/// Answers every URL with a fixed preview.
pub struct StubMetadataFetcher;

#[async_trait]
impl MetadataFetcher for StubMetadataFetcher {
    async fn fetch(&self, url: &Url) -> MetadataResult {
        MetadataResult {
            success: 1,
            meta: LinkMetadata {
                title: format!("Title of {}", url.host_str().unwrap_or_default()),
                description: "A stubbed description".to_string(),
                image: Some(ImageRef { url: None }),
                site_name: None,
                favicon: format!("{}/favicon.ico", url.origin().ascii_serialization()),
            },
        }
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub mailer: CapturingMailer,
}

pub fn create_test_state(config: &Config, mailer: CapturingMailer) -> AppState {
    let integrations = Integrations {
        cache: Arc::new(NullCache::new()),
        geo: Arc::new(StubGeoLocator),
        mailer: Arc::new(mailer),
        metadata: Arc::new(StubMetadataFetcher),
    };

    AppState::new(config, Repositories::in_memory(), integrations)
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(config: Config) -> TestApp {
    let mailer = CapturingMailer::default();
    let state = create_test_state(&config, mailer.clone());
    let server = TestServer::new(router(state)).unwrap();

    TestApp { server, mailer }
}

impl TestApp {
    pub async fn new_session(&self) -> String {
        let response = self.server.post("/api/session").await;
        response.assert_status_ok();
        response.json::<Value>()["sessionId"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Creates a link and returns the response body.
    pub async fn create_link(&self, body: Value) -> Value {
        let response = self.server.post("/api/links").json(&body).await;
        response.assert_status_ok();
        response.json::<Value>()
    }

    pub async fn create_simple_link(&self, session_id: &str, url: &str) -> Value {
        self.create_link(json!({ "originalUrl": url, "sessionId": session_id }))
            .await
    }

    pub async fn list_links(&self, session_id: &str) -> Vec<Value> {
        let response = self
            .server
            .get("/api/links")
            .add_query_param("sessionId", session_id)
            .add_query_param("showBulk", "true")
            .await;
        response.assert_status_ok();
        response.json::<Vec<Value>>()
    }

    pub async fn find_link(&self, session_id: &str, code: &str) -> Value {
        self.list_links(session_id)
            .await
            .into_iter()
            .find(|l| l["shortUrl"] == code)
            .unwrap_or_else(|| panic!("link {code} not listed"))
    }

    pub async fn find_link_by_url(&self, session_id: &str, url: &str) -> Value {
        self.list_links(session_id)
            .await
            .into_iter()
            .find(|l| l["originalUrl"] == url)
            .unwrap_or_else(|| panic!("no link to {url}"))
    }

    pub async fn click(&self, code: &str) -> axum_test::TestResponse {
        self.server
            .get(&format!("/api/click/{code}"))
            .add_header("User-Agent", DESKTOP_UA)
            .await
    }
}

/// Short code at the end of a full short URL.
pub fn code_of(full_short_url: &Value) -> String {
    full_short_url
        .as_str()
        .unwrap()
        .rsplit('/')
        .next()
        .unwrap()
        .to_string()
}
