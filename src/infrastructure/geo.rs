//! IP geolocation over HTTP.
//!
//! The lookup endpoint is configured as a URL template containing `{ip}`, e.g.
//! `https://ipinfo.io/{ip}/country?token=...`. Both plain-text bodies (`US`)
//! and JSON bodies carrying `country_code`, `countryCode` or `country` are
//! understood.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("geolocation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("geolocation service answered {0}")]
    Status(reqwest::StatusCode),
}

/// Resolves an IP address to an ISO country code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Returns `Ok(None)` when the service has no answer for the address.
    async fn lookup(&self, ip: IpAddr) -> Result<Option<String>, GeoError>;
}

/// [`GeoLocator`] backed by a third-party HTTP service.
pub struct HttpGeoLocator {
    client: reqwest::Client,
    url_template: String,
}

impl HttpGeoLocator {
    pub fn new(url_template: String, timeout: Duration) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url_template,
        })
    }
}

#[async_trait]
impl GeoLocator for HttpGeoLocator {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<String>, GeoError> {
        let url = self.url_template.replace("{ip}", &ip.to_string());
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(GeoError::Status(response.status()));
        }

        let body = response.text().await?;
        Ok(parse_country(&body))
    }
}

/// Used when no geolocation endpoint is configured.
pub struct DisabledGeoLocator;

#[async_trait]
impl GeoLocator for DisabledGeoLocator {
    async fn lookup(&self, _ip: IpAddr) -> Result<Option<String>, GeoError> {
        Ok(None)
    }
}

/// Extracts a two-letter country code from a service response body.
pub fn parse_country(body: &str) -> Option<String> {
    let body = body.trim();

    let candidate = if body.starts_with('{') {
        let value: Value = serde_json::from_str(body).ok()?;
        ["country_code", "countryCode", "country"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str))?
            .trim()
            .to_string()
    } else {
        body.to_string()
    };

    let valid = candidate.len() == 2 && candidate.chars().all(|c| c.is_ascii_alphabetic());
    valid.then(|| candidate.to_ascii_uppercase())
}
