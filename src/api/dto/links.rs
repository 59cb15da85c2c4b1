//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::application::services::{CreateLink, ExpirationUpdate};
use crate::domain::entities::{ExpirationType, Link, LinkSource, LinkStatus};
use crate::domain::expiration::build_policy;
use crate::error::AppError;

/// Body of `POST /api/links`.
///
/// Required fields default to empty so that a missing value is reported by
/// the service with its own status instead of a body rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    #[serde(default)]
    pub original_url: String,

    #[serde(default)]
    pub session_id: String,

    pub custom_alias: Option<String>,

    /// Branded host, e.g. `go.brand.com`.
    pub custom_domain: Option<String>,

    pub expiration_type: Option<ExpirationType>,

    pub expires_at: Option<DateTime<Utc>>,

    pub expire_after_clicks: Option<i64>,
}

impl TryFrom<CreateLinkRequest> for CreateLink {
    type Error = AppError;

    fn try_from(req: CreateLinkRequest) -> Result<Self, Self::Error> {
        let expiration = build_policy(
            req.expiration_type.unwrap_or(ExpirationType::None),
            req.expires_at,
            req.expire_after_clicks,
        )?;

        Ok(CreateLink {
            original_url: req.original_url,
            session_id: req.session_id,
            custom_alias: req.custom_alias.filter(|a| !a.trim().is_empty()),
            custom_domain: req.custom_domain.filter(|d| !d.trim().is_empty()),
            expiration,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkResponse {
    pub short_url: String,
    pub custom_alias: Option<String>,
}

/// Link record as returned to its owner.
///
/// `status` is the effective status: the stored flag combined with a live
/// evaluation of the policy.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkView {
    pub id: i64,
    pub original_url: String,
    pub short_url: String,
    pub full_short_url: String,
    pub custom_alias: Option<String>,
    pub domain: String,
    pub total_clicks: i64,
    pub expiration_type: ExpirationType,
    pub expires_at: Option<DateTime<Utc>>,
    pub expire_after_clicks: Option<i64>,
    pub status: LinkStatus,
    pub source: LinkSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulk_batch_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LinkView {
    pub fn new(link: Link, now: DateTime<Utc>) -> Self {
        let status = link.effective_status(now);
        Self {
            id: link.id,
            original_url: link.original_url,
            short_url: link.short_code,
            full_short_url: link.full_short_url,
            custom_alias: link.custom_alias,
            domain: link.domain,
            total_clicks: link.total_clicks,
            expiration_type: link.expiration.kind(),
            expires_at: link.expiration.expires_at(),
            expire_after_clicks: link.expiration.expire_after_clicks(),
            status,
            source: link.source,
            bulk_batch_id: link.bulk_batch_id,
            created_at: link.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLinksQuery {
    #[serde(default)]
    pub session_id: String,

    #[serde(default)]
    pub show_bulk: bool,
}

/// Query of `DELETE` and `PUT /api/links`.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkQuery {
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub id: Option<i64>,

    pub session_id: Option<String>,
}

/// Bulk delete body. Ids are accepted as numbers or numeric strings.
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    #[serde_as(as = "Vec<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub ids: Vec<i64>,

    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteLinksResponse {
    pub success: bool,
    pub deleted: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAliasRequest {
    #[serde(default)]
    pub custom_alias: String,
}

/// Body of `PATCH /api/links`. The new policy fully replaces the old one.
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpirationRequest {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: i64,

    pub session_id: Option<String>,

    pub expiration_type: ExpirationType,

    pub expires_at: Option<DateTime<Utc>>,

    pub expire_after_clicks: Option<i64>,
}

impl UpdateExpirationRequest {
    pub fn update(&self) -> ExpirationUpdate {
        ExpirationUpdate {
            kind: self.expiration_type,
            expires_at: self.expires_at,
            expire_after_clicks: self.expire_after_clicks,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateAliasQuery {
    #[serde(default)]
    pub alias: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateAliasResponse {
    pub valid: bool,
    pub available: bool,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ExpirationPolicy;
    use serde_json::json;

    #[test]
    fn test_create_request_builds_click_policy() {
        let req: CreateLinkRequest = serde_json::from_value(json!({
            "originalUrl": "https://example.com",
            "sessionId": "s1",
            "customAlias": "",
            "expirationType": "clicks",
            "expireAfterClicks": 3
        }))
        .unwrap();

        let cmd = CreateLink::try_from(req).unwrap();
        assert_eq!(cmd.expiration, ExpirationPolicy::Clicks(3));
        assert!(cmd.custom_alias.is_none());
    }

    #[test]
    fn test_create_request_requires_selected_bound() {
        let req: CreateLinkRequest = serde_json::from_value(json!({
            "originalUrl": "https://example.com",
            "sessionId": "s1",
            "expirationType": "datetime"
        }))
        .unwrap();

        assert!(matches!(
            CreateLink::try_from(req),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_bulk_delete_accepts_mixed_ids() {
        let req: BulkDeleteRequest =
            serde_json::from_value(json!({ "ids": [1, "2", 3], "sessionId": "s1" })).unwrap();
        assert_eq!(req.ids, vec![1, 2, 3]);
        assert_eq!(req.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_patch_request_accepts_string_id() {
        let req: UpdateExpirationRequest = serde_json::from_value(json!({
            "id": "7",
            "expirationType": "none"
        }))
        .unwrap();
        assert_eq!(req.id, 7);
        assert_eq!(req.update().kind, ExpirationType::None);
    }
}
