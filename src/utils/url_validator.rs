//! Destination URL validation.
//!
//! A destination must parse as an absolute `http` or `https` URL. Single link
//! creation stores the submitted string untouched so a redirect returns exactly
//! what was given; bulk import stores the parsed form ([`Url::as_str`]).

use serde_json::json;
use url::Url;

use crate::error::AppError;

/// Errors that can occur while validating a destination URL.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Invalid URL format")]
    InvalidFormat,

    #[error("Invalid URL protocol")]
    UnsupportedProtocol,
}

impl From<UrlValidationError> for AppError {
    fn from(e: UrlValidationError) -> Self {
        AppError::bad_request(e.to_string(), json!({ "field": "originalUrl" }))
    }
}

/// Parses `input` as an absolute HTTP(S) URL.
///
/// Rejects dangerous schemes like `javascript:`, `data:` and `file:`.
/// Control characters are rejected rather than stripped, since the raw input
/// is what later lands in a `Location` header.
///
/// # Errors
///
/// Returns [`UrlValidationError::InvalidFormat`] for malformed or relative URLs
/// and for input containing ASCII control characters.
/// Returns [`UrlValidationError::UnsupportedProtocol`] for non-HTTP(S) schemes.
pub fn parse_destination(input: &str) -> Result<Url, UrlValidationError> {
    if input.chars().any(|c| c.is_ascii_control()) {
        return Err(UrlValidationError::InvalidFormat);
    }

    let url = Url::parse(input.trim()).map_err(|_| UrlValidationError::InvalidFormat)?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::InvalidFormat);
    }

    Ok(url)
}

/// Normalizes a branded domain to its lowercase `host[:port]` authority.
///
/// A leading scheme and trailing slash are dropped, so `https://Go.Brand.com/`
/// and `go.brand.com` are the same domain. Paths, queries and credentials are
/// rejected.
///
/// # Errors
///
/// Returns [`UrlValidationError::InvalidFormat`] if no usable host remains.
pub fn parse_custom_domain(input: &str) -> Result<String, UrlValidationError> {
    let trimmed = input.trim();
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(UrlValidationError::InvalidFormat);
    }

    let bare = trimmed
        .split_once("://")
        .map_or(trimmed, |(_, rest)| rest)
        .trim_end_matches('/');
    if bare.is_empty() {
        return Err(UrlValidationError::InvalidFormat);
    }

    let url =
        Url::parse(&format!("http://{bare}")).map_err(|_| UrlValidationError::InvalidFormat)?;
    if url.path() != "/"
        || url.query().is_some()
        || url.fragment().is_some()
        || !url.username().is_empty()
        || url.password().is_some()
    {
        return Err(UrlValidationError::InvalidFormat);
    }

    authority(&url).ok_or(UrlValidationError::InvalidFormat)
}

/// `host[:port]` of a stored link domain such as `https://go.brand.com`.
pub fn domain_authority(domain: &str) -> Option<String> {
    Url::parse(domain).ok().as_ref().and_then(authority)
}

fn authority(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
