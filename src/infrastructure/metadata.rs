//! Open-graph metadata extraction for link previews.
//!
//! Fetch failures never surface as errors: the caller always receives a
//! [`MetadataResult`], degraded to hostname/origin defaults with `success: 0`.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use url::Url;

/// Browser user agent sent with metadata requests; some sites hide tags from bots.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Pages larger than this are cut before parsing.
const DOWNLOAD_LIMIT: usize = 5_000_000;

const NO_DESCRIPTION: &str = "No description available";

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\s[^>]*>").expect("valid meta regex"));
static LINK_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\s[^>]*>").expect("valid link regex"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z:_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid attr regex")
});
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMetadata {
    pub title: String,
    pub description: String,
    /// `None` only in the degraded fallback; a parsed page always carries an
    /// image object, possibly with a null URL.
    pub image: Option<ImageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    pub favicon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataResult {
    /// `1` when the page was fetched and parsed, `0` for the degraded fallback.
    pub success: u8,
    pub meta: LinkMetadata,
}

impl MetadataResult {
    /// Degraded answer built from the URL alone.
    pub fn fallback(url: &Url) -> Self {
        Self {
            success: 0,
            meta: LinkMetadata {
                title: url.host_str().unwrap_or_default().to_string(),
                description: NO_DESCRIPTION.to_string(),
                image: None,
                site_name: None,
                favicon: default_favicon(url),
            },
        }
    }
}

#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> MetadataResult;
}

pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    async fn download(&self, url: &Url) -> Result<String, MetadataError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;

        if let Some(length) = response.content_length()
            && exceeds_limit(length)
        {
            return Err(MetadataError::TooLarge(length));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if !push_capped(&mut body, &chunk, DOWNLOAD_LIMIT) {
                break;
            }
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[derive(Debug, thiserror::Error)]
enum MetadataError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("page too large ({0} bytes)")]
    TooLarge(u64),
}

fn exceeds_limit(content_length: u64) -> bool {
    usize::try_from(content_length).map_or(true, |len| len > DOWNLOAD_LIMIT)
}

/// Appends at most `limit - buf.len()` bytes of `chunk`; returns `false` once `buf` is full.
fn push_capped(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(buf.len());
    buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
    buf.len() < limit
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, url: &Url) -> MetadataResult {
        match self.download(url).await {
            Ok(html) => MetadataResult {
                success: 1,
                meta: extract_metadata(&html, url),
            },
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Metadata fetch failed");
                MetadataResult::fallback(url)
            }
        }
    }
}

fn default_favicon(url: &Url) -> String {
    format!("{}/favicon.ico", url.origin().ascii_serialization())
}

fn attributes(tag: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(tag)
        .filter_map(|c| {
            let name = c.get(1)?.as_str().to_ascii_lowercase();
            let value = c.get(2).or_else(|| c.get(3))?.as_str();
            Some((name, decode_entities(value.trim())))
        })
        .collect()
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Extracts title, description, image, site name and favicon from a page.
///
/// Sources are tried in order: open-graph, twitter, Dublin Core, then plain HTML.
pub fn extract_metadata(html: &str, page_url: &Url) -> LinkMetadata {
    let mut meta: HashMap<String, String> = HashMap::new();

    for tag in META_TAG_RE.find_iter(html) {
        let attrs = attributes(tag.as_str());
        let key = attrs.get("property").or_else(|| attrs.get("name"));
        if let (Some(key), Some(content)) = (key, attrs.get("content"))
            && !content.is_empty()
        {
            meta.entry(key.to_ascii_lowercase())
                .or_insert_with(|| content.clone());
        }
    }

    let first = |keys: &[&str]| keys.iter().find_map(|k| meta.get(*k).cloned());

    let html_title = TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|t| !t.is_empty());

    let title = first(&["og:title", "twitter:title", "dc.title"])
        .or(html_title)
        .unwrap_or_else(|| page_url.host_str().unwrap_or_default().to_string());

    let description = first(&[
        "og:description",
        "twitter:description",
        "dc.description",
        "description",
    ])
    .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    let image = Some(ImageRef {
        url: first(&["og:image", "og:image:url", "twitter:image", "twitter:image:src"])
            .and_then(|src| page_url.join(&src).ok())
            .map(|u| u.to_string()),
    });

    let site_name = first(&["og:site_name", "twitter:site"]);

    let favicon = LINK_TAG_RE
        .find_iter(html)
        .map(|tag| attributes(tag.as_str()))
        .find(|attrs| {
            attrs
                .get("rel")
                .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("icon")))
        })
        .and_then(|attrs| attrs.get("href").cloned())
        .and_then(|href| page_url.join(&href).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .map(|u| u.to_string())
        .unwrap_or_else(|| default_favicon(page_url));

    LinkMetadata {
        title,
        description,
        image,
        site_name,
        favicon,
    }
}
