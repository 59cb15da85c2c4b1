//! Link entity representing a shortened URL mapping.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::expiration;

/// Policy selector for when a link stops resolving.
///
/// Exactly one bound is meaningful per variant, so the "expiresAt present iff
/// datetime" rule is carried by the type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpirationPolicy {
    #[default]
    None,
    /// Expired once `now > at`.
    DateTime(DateTime<Utc>),
    /// Expired once `total_clicks >= n`.
    Clicks(i64),
}

impl ExpirationPolicy {
    pub fn kind(&self) -> ExpirationType {
        match self {
            ExpirationPolicy::None => ExpirationType::None,
            ExpirationPolicy::DateTime(_) => ExpirationType::DateTime,
            ExpirationPolicy::Clicks(_) => ExpirationType::Clicks,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ExpirationPolicy::DateTime(at) => Some(*at),
            _ => None,
        }
    }

    pub fn expire_after_clicks(&self) -> Option<i64> {
        match self {
            ExpirationPolicy::Clicks(n) => Some(*n),
            _ => None,
        }
    }
}

/// Wire/storage name of an [`ExpirationPolicy`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpirationType {
    None,
    #[serde(rename = "datetime")]
    DateTime,
    Clicks,
}

impl ExpirationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpirationType::None => "none",
            ExpirationType::DateTime => "datetime",
            ExpirationType::Clicks => "clicks",
        }
    }
}

impl FromStr for ExpirationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ExpirationType::None),
            "datetime" => Ok(ExpirationType::DateTime),
            "clicks" => Ok(ExpirationType::Clicks),
            other => Err(format!("unknown expiration type '{other}'")),
        }
    }
}

/// Cached lifecycle flag. It may lag behind the policy, see [`expiration::is_expired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active,
    Expired,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Active => "active",
            LinkStatus::Expired => "expired",
        }
    }
}

impl FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LinkStatus::Active),
            "expired" => Ok(LinkStatus::Expired),
            other => Err(format!("unknown link status '{other}'")),
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance tag. Only used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkSource {
    Single,
    Bulk,
}

impl LinkSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkSource::Single => "single",
            LinkSource::Bulk => "bulk",
        }
    }
}

impl FromStr for LinkSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(LinkSource::Single),
            "bulk" => Ok(LinkSource::Bulk),
            other => Err(format!("unknown link source '{other}'")),
        }
    }
}

/// A shortened URL owned by a session.
///
/// `short_code` is globally unique; when `custom_alias` is set it equals
/// `short_code`. `total_clicks` always matches the length of the click log.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub full_short_url: String,
    pub custom_alias: Option<String>,
    pub session_id: String,
    pub domain: String,
    pub total_clicks: i64,
    pub expiration: ExpirationPolicy,
    pub status: LinkStatus,
    pub source: LinkSource,
    pub bulk_batch_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Returns true if the cached flag or the live policy says the link is retired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        expiration::is_expired(self.status, &self.expiration, self.total_clicks, now)
    }

    /// Status as it should be reported to readers right now.
    pub fn effective_status(&self, now: DateTime<Utc>) -> LinkStatus {
        if self.is_expired_at(now) {
            LinkStatus::Expired
        } else {
            LinkStatus::Active
        }
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub original_url: String,
    pub short_code: String,
    pub full_short_url: String,
    pub custom_alias: Option<String>,
    pub session_id: String,
    pub domain: String,
    pub expiration: ExpirationPolicy,
    pub status: LinkStatus,
    pub source: LinkSource,
    pub bulk_batch_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) fn sample_link(expiration: ExpirationPolicy, total_clicks: i64) -> Link {
        Link {
            id: 1,
            original_url: "https://example.com".to_string(),
            short_code: "abcd1234".to_string(),
            full_short_url: "http://localhost:3000/abcd1234".to_string(),
            custom_alias: None,
            session_id: "s1".to_string(),
            domain: "http://localhost:3000".to_string(),
            total_clicks,
            expiration,
            status: LinkStatus::Active,
            source: LinkSource::Single,
            bulk_batch_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_policy_accessors() {
        let at = Utc::now();
        let policy = ExpirationPolicy::DateTime(at);
        assert_eq!(policy.kind(), ExpirationType::DateTime);
        assert_eq!(policy.expires_at(), Some(at));
        assert_eq!(policy.expire_after_clicks(), None);

        let policy = ExpirationPolicy::Clicks(3);
        assert_eq!(policy.kind(), ExpirationType::Clicks);
        assert_eq!(policy.expires_at(), None);
        assert_eq!(policy.expire_after_clicks(), Some(3));

        assert_eq!(ExpirationPolicy::default().kind(), ExpirationType::None);
    }

    #[test]
    fn test_enum_string_forms() {
        for kind in [
            ExpirationType::None,
            ExpirationType::DateTime,
            ExpirationType::Clicks,
        ] {
            assert_eq!(kind.as_str().parse::<ExpirationType>().unwrap(), kind);
        }
        assert_eq!("expired".parse::<LinkStatus>().unwrap(), LinkStatus::Expired);
        assert_eq!("bulk".parse::<LinkSource>().unwrap(), LinkSource::Bulk);
        assert!("archived".parse::<LinkStatus>().is_err());
    }

    #[test]
    fn test_expiration_type_serde() {
        let json = serde_json::to_string(&ExpirationType::DateTime).unwrap();
        assert_eq!(json, "\"datetime\"");
        let parsed: ExpirationType = serde_json::from_str("\"clicks\"").unwrap();
        assert_eq!(parsed, ExpirationType::Clicks);
    }

    #[test]
    fn test_effective_status_recomputes_policy() {
        let now = Utc::now();
        let link = sample_link(ExpirationPolicy::Clicks(2), 2);
        assert_eq!(link.status, LinkStatus::Active);
        assert_eq!(link.effective_status(now), LinkStatus::Expired);

        let link = sample_link(ExpirationPolicy::DateTime(now + Duration::hours(1)), 0);
        assert_eq!(link.effective_status(now), LinkStatus::Active);
    }

    #[test]
    fn test_cached_expired_flag_wins() {
        let mut link = sample_link(ExpirationPolicy::None, 0);
        link.status = LinkStatus::Expired;
        assert!(link.is_expired_at(Utc::now()));
    }
}
