//! Link creation, ownership-scoped management and bulk import.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::{ExpirationPolicy, ExpirationType, Link, LinkSource, LinkStatus, NewLink};
use crate::domain::expiration::{build_policy, status_for};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::{ALIAS_FORMAT_MESSAGE, generate_code, parse_alias};
use crate::utils::url_validator::{UrlValidationError, parse_custom_domain, parse_destination};

/// Input for a single link creation.
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    pub original_url: String,
    pub session_id: String,
    pub custom_alias: Option<String>,
    /// Branded host the link is served on; the platform domain when absent.
    pub custom_domain: Option<String>,
    pub expiration: ExpirationPolicy,
}

/// Replacement expiration settings, in wire form.
#[derive(Debug, Clone)]
pub struct ExpirationUpdate {
    pub kind: ExpirationType,
    pub expires_at: Option<DateTime<Utc>>,
    pub expire_after_clicks: Option<i64>,
}

/// Answer of the public alias availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasAvailability {
    pub valid: bool,
    pub available: bool,
    pub message: &'static str,
}

/// Per-URL outcome of a bulk import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkItem {
    Created {
        original_url: String,
        short_url: String,
    },
    Failed {
        original_url: String,
        error: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct BulkOutcome {
    pub batch_id: String,
    pub results: Vec<BulkItem>,
}

/// Service for creating and managing session-owned short links.
///
/// Every operation except creation-by-code lookups is scoped to the owner
/// key (`session_id`); a link belonging to another session behaves as absent.
pub struct LinkService<R: LinkRepository + ?Sized> {
    repository: Arc<R>,
    base_url: String,
    scheme: String,
    bulk_max_urls: usize,
}

fn require_session(session_id: &str) -> Result<(), AppError> {
    if session_id.trim().is_empty() {
        return Err(AppError::unauthorized("Missing session ID", json!({})));
    }
    Ok(())
}

fn link_not_found(id: i64) -> AppError {
    AppError::not_found("Link not found", json!({ "id": id }))
}

fn alias_taken(alias: &str) -> AppError {
    AppError::conflict("Alias already in use", json!({ "alias": alias }))
}

impl<R: LinkRepository + ?Sized> LinkService<R> {
    /// Creates a new link service.
    ///
    /// `base_url` prefixes every `full_short_url` and is the default domain.
    pub fn new(repository: Arc<R>, base_url: impl Into<String>, bulk_max_urls: usize) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let scheme = base_url
            .split_once("://")
            .map_or("https", |(scheme, _)| scheme)
            .to_string();
        Self {
            repository,
            base_url,
            scheme,
            bulk_max_urls,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Round-trips the link store. Used by the health check.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }

    /// Absolute short link for `code` on the platform domain.
    pub fn short_url_for(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    /// Stored `domain` for a link: the branded host under the platform's
    /// scheme, or the platform base URL.
    fn domain_for(&self, custom_domain: Option<&str>) -> Result<String, AppError> {
        match custom_domain.map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => {
                let authority = parse_custom_domain(raw).map_err(|_| {
                    AppError::bad_request(
                        "Invalid custom domain",
                        json!({ "field": "customDomain" }),
                    )
                })?;
                Ok(format!("{}://{authority}", self.scheme))
            }
            None => Ok(self.base_url.clone()),
        }
    }

    /// Creates a short link.
    ///
    /// The destination is stored exactly as submitted so resolution returns
    /// it untransformed. Without an alias the code is derived from a salted
    /// hash of the URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the session ID is missing.
    /// Returns [`AppError::Validation`] for a missing or malformed URL or alias.
    /// Returns [`AppError::Conflict`] if the alias is already taken.
    pub async fn create(&self, input: CreateLink) -> Result<Link, AppError> {
        require_session(&input.session_id)?;

        if input.original_url.trim().is_empty() {
            return Err(AppError::bad_request(
                "Missing required fields",
                json!({ "field": "originalUrl" }),
            ));
        }
        parse_destination(&input.original_url)?;
        let domain = self.domain_for(input.custom_domain.as_deref())?;

        let alias = match input.custom_alias.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let alias = parse_alias(raw)?;
                if self.repository.code_exists(&alias, None).await? {
                    return Err(alias_taken(&alias));
                }
                Some(alias)
            }
            _ => None,
        };

        let short_code = alias
            .clone()
            .unwrap_or_else(|| generate_code(&input.original_url));

        let new_link = NewLink {
            full_short_url: format!("{domain}/{short_code}"),
            original_url: input.original_url,
            short_code,
            custom_alias: alias.clone(),
            session_id: input.session_id,
            domain,
            status: status_for(&input.expiration, 0, Utc::now()),
            expiration: input.expiration,
            source: LinkSource::Single,
            bulk_batch_id: None,
        };

        let link = self
            .repository
            .create(new_link)
            .await
            .map_err(|e| match (e, &alias) {
                (AppError::Conflict { .. }, Some(alias)) => alias_taken(alias),
                (AppError::Conflict { .. }, None) => {
                    AppError::conflict("Short URL already exists", json!({}))
                }
                (other, _) => other,
            })?;

        tracing::info!(
            link_id = link.id,
            code = %link.short_code,
            expiration = link.expiration.kind().as_str(),
            "Short link created"
        );

        Ok(link)
    }

    /// Lists a session's links, newest first, optionally including bulk imports.
    pub async fn list(&self, session_id: &str, include_bulk: bool) -> Result<Vec<Link>, AppError> {
        require_session(session_id)?;
        self.repository
            .list_by_session(session_id, include_bulk)
            .await
    }

    /// Retrieves a link by the code it resolves on.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link uses the code.
    pub async fn get_by_code(&self, code: &str) -> Result<Link, AppError> {
        self.repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "code": code })))
    }

    /// Deletes one owned link.
    pub async fn delete(&self, id: i64, session_id: &str) -> Result<(), AppError> {
        if session_id.trim().is_empty() {
            return Err(AppError::bad_request("Session ID required", json!({})));
        }

        if !self.repository.delete(id, session_id).await? {
            return Err(link_not_found(id));
        }

        tracing::info!(link_id = id, "Link deleted");
        Ok(())
    }

    /// Deletes every listed link owned by the session; foreign ids are ignored.
    pub async fn delete_many(&self, ids: Vec<i64>, session_id: &str) -> Result<u64, AppError> {
        require_session(session_id)?;
        if ids.is_empty() {
            return Ok(0);
        }

        let requested = ids.len();
        let deleted = self.repository.delete_many(ids, session_id).await?;
        tracing::info!(requested, deleted, "Bulk delete");
        Ok(deleted)
    }

    /// Replaces a link's code with a custom alias.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] on a bad alias format.
    /// Returns [`AppError::Conflict`] if another link already uses the alias.
    /// Returns [`AppError::NotFound`] if the session owns no such link.
    pub async fn update_alias(
        &self,
        id: i64,
        session_id: &str,
        custom_alias: &str,
    ) -> Result<Link, AppError> {
        if session_id.trim().is_empty() {
            return Err(AppError::bad_request("Missing parameters", json!({})));
        }

        let alias = parse_alias(custom_alias.trim())?;

        if self.repository.code_exists(&alias, Some(id)).await? {
            return Err(alias_taken(&alias));
        }

        self.repository
            .update_alias(id, session_id, &alias)
            .await
            .map_err(|e| match e {
                AppError::Conflict { .. } => alias_taken(&alias),
                other => other,
            })?
            .ok_or_else(|| link_not_found(id))
    }

    /// Fully replaces a link's expiration policy.
    ///
    /// The new status is derived from the new policy against the current
    /// click count, so a bound that is already met is stored as expired.
    /// When `session_id` is given the link must belong to it.
    pub async fn update_expiration(
        &self,
        id: i64,
        session_id: Option<String>,
        update: ExpirationUpdate,
    ) -> Result<Link, AppError> {
        let policy = build_policy(update.kind, update.expires_at, update.expire_after_clicks)?;

        let current = self
            .repository
            .find_by_id(id)
            .await?
            .filter(|link| session_id.as_deref().is_none_or(|s| s == link.session_id))
            .ok_or_else(|| link_not_found(id))?;

        let status = status_for(&policy, current.total_clicks, Utc::now());

        let updated = self
            .repository
            .update_expiration(id, session_id, policy, status)
            .await?
            .ok_or_else(|| link_not_found(id))?;

        tracing::info!(
            link_id = id,
            expiration = policy.kind().as_str(),
            status = %updated.status,
            "Expiration updated"
        );

        Ok(updated)
    }

    /// Retires a link immediately regardless of its policy.
    pub async fn expire_now(&self, code: &str) -> Result<Link, AppError> {
        let mut link = self.get_by_code(code).await?;

        if !self.repository.mark_expired(link.id).await? {
            return Err(link_not_found(link.id));
        }

        link.status = LinkStatus::Expired;
        tracing::info!(link_id = link.id, code = %code, "Link expired manually");
        Ok(link)
    }

    /// Deletes a link by code regardless of owner. Used by operators.
    pub async fn delete_by_code(&self, code: &str) -> Result<Link, AppError> {
        let link = self.get_by_code(code).await?;
        if !self.repository.delete(link.id, &link.session_id).await? {
            return Err(link_not_found(link.id));
        }
        Ok(link)
    }

    /// Read-only availability check for a prospective alias.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when no alias is given.
    pub async fn check_alias(&self, alias: &str) -> Result<AliasAvailability, AppError> {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(AppError::bad_request("Alias required", json!({})));
        }

        let Ok(normalized) = parse_alias(alias) else {
            return Ok(AliasAvailability {
                valid: false,
                available: false,
                message: ALIAS_FORMAT_MESSAGE,
            });
        };

        let taken = self.repository.code_exists(&normalized, None).await?;
        Ok(AliasAvailability {
            valid: !taken,
            available: !taken,
            message: if taken { "Alias unavailable" } else { "Available" },
        })
    }

    /// Imports a batch of URLs for a session, one at a time.
    ///
    /// A failing URL never aborts the batch; it gets an error entry instead.
    /// Links created before a failure stay created.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the batch is empty or exceeds the cap.
    pub async fn bulk_create(
        &self,
        urls: Vec<String>,
        session_id: &str,
    ) -> Result<BulkOutcome, AppError> {
        require_session(session_id)?;

        if urls.is_empty() {
            return Err(AppError::bad_request("No URLs provided", json!({})));
        }
        if urls.len() > self.bulk_max_urls {
            return Err(AppError::bad_request(
                format!("Too many URLs (max {})", self.bulk_max_urls),
                json!({ "max": self.bulk_max_urls, "received": urls.len() }),
            ));
        }

        let batch_id = Uuid::new_v4().to_string();
        let mut results = Vec::with_capacity(urls.len());

        for original_url in urls {
            results.push(self.bulk_item(original_url, session_id, &batch_id).await);
        }

        let created = results
            .iter()
            .filter(|r| matches!(r, BulkItem::Created { .. }))
            .count();
        tracing::info!(batch_id = %batch_id, total = results.len(), created, "Bulk import finished");

        Ok(BulkOutcome { batch_id, results })
    }

    async fn bulk_item(&self, original_url: String, session_id: &str, batch_id: &str) -> BulkItem {
        let parsed = match parse_destination(original_url.trim()) {
            Ok(url) => url,
            Err(e) => {
                let error = match e {
                    UrlValidationError::InvalidFormat => "Invalid URL format",
                    UrlValidationError::UnsupportedProtocol => "Invalid URL protocol",
                };
                return BulkItem::Failed {
                    original_url,
                    error,
                };
            }
        };

        let href = parsed.as_str().to_string();
        let short_code = generate_code(&href);

        let new_link = NewLink {
            original_url: href.clone(),
            full_short_url: self.short_url_for(&short_code),
            short_code,
            custom_alias: None,
            session_id: session_id.to_string(),
            domain: self.base_url.clone(),
            expiration: ExpirationPolicy::None,
            status: LinkStatus::Active,
            source: LinkSource::Bulk,
            bulk_batch_id: Some(batch_id.to_string()),
        };

        match self.repository.create(new_link).await {
            Ok(link) => BulkItem::Created {
                original_url: href,
                short_url: link.full_short_url,
            },
            Err(AppError::Conflict { .. }) => BulkItem::Failed {
                original_url,
                error: "Short URL already exists",
            },
            Err(e) => {
                tracing::error!(url = %original_url, error = %e, "Bulk item failed");
                BulkItem::Failed {
                    original_url,
                    error: "Processing failed",
                }
            }
        }
    }
}
