//! Repository trait for links and their click history.

use crate::domain::analytics::LinkActivity;
use crate::domain::entities::{ExpirationPolicy, Link, LinkStatus, NewClick, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Store-wide counters used by the admin CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkTotals {
    pub links: i64,
    pub active_links: i64,
    pub clicks: i64,
}

/// Repository interface for managing links.
///
/// Every mutation is a single atomic statement or transaction against the
/// store; implementations keep no authoritative in-process copies.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryLinkRepository`] - process-local store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code or alias is already taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Finds a link by the code it resolves on.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Returns true if `code` is used as either a short code or a custom alias.
    ///
    /// `exclude_id` skips one link, so a link may keep its own alias on update.
    async fn code_exists(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    /// Lists links owned by a session, newest first.
    ///
    /// Bulk-imported links are only included when `include_bulk` is true.
    async fn list_by_session(
        &self,
        session_id: &str,
        include_bulk: bool,
    ) -> Result<Vec<Link>, AppError>;

    /// Deletes one owned link. Returns `Ok(false)` if no such link exists for the session.
    async fn delete(&self, id: i64, session_id: &str) -> Result<bool, AppError>;

    /// Deletes the given owned links and returns how many were removed.
    ///
    /// Ids owned by other sessions are ignored.
    async fn delete_many(&self, ids: Vec<i64>, session_id: &str) -> Result<u64, AppError>;

    /// Replaces the custom alias (and therefore the short code) of an owned link.
    ///
    /// `full_short_url` is rebuilt on the link's own domain.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if another link already uses the alias.
    async fn update_alias(
        &self,
        id: i64,
        session_id: &str,
        alias: &str,
    ) -> Result<Option<Link>, AppError>;

    /// Replaces the expiration policy and writes the status derived from it.
    ///
    /// When `session_id` is given, only a link owned by that session is updated.
    async fn update_expiration(
        &self,
        id: i64,
        session_id: Option<String>,
        policy: ExpirationPolicy,
        status: LinkStatus,
    ) -> Result<Option<Link>, AppError>;

    /// Flips the cached status to `expired`. Idempotent.
    async fn mark_expired(&self, id: i64) -> Result<bool, AppError>;

    /// Records one click atomically.
    ///
    /// In a single transaction: increments `total_clicks` only if the link is
    /// still live at `now`, appends the click and adds the visitor fingerprint
    /// to the link's set (a no-op for a repeat visitor).
    ///
    /// Returns the post-increment link, or `Ok(None)` when the guard rejected
    /// the click because the link expired (or vanished) concurrently.
    async fn record_click(
        &self,
        click: NewClick,
        now: DateTime<Utc>,
    ) -> Result<Option<Link>, AppError>;

    /// Loads every link of a session together with its clicks and visitor set.
    async fn activity_by_session(&self, session_id: &str) -> Result<Vec<LinkActivity>, AppError>;

    async fn totals(&self) -> Result<LinkTotals, AppError>;

    /// Cheap round trip used by the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}
