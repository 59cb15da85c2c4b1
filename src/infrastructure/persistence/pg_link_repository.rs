//! PostgreSQL implementation of link repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;

use crate::domain::analytics::LinkActivity;
use crate::domain::entities::{
    Click, ExpirationPolicy, ExpirationType, Link, LinkStatus, NewClick, NewLink,
};
use crate::domain::repositories::{LinkRepository, LinkTotals};
use crate::error::AppError;

macro_rules! link_columns {
    () => {
        "id, original_url, short_code, full_short_url, custom_alias, session_id, domain, \
         total_clicks, expiration_type, expires_at, expire_after_clicks, status, source, \
         bulk_batch_id, created_at"
    };
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    original_url: String,
    short_code: String,
    full_short_url: String,
    custom_alias: Option<String>,
    session_id: String,
    domain: String,
    total_clicks: i64,
    expiration_type: String,
    expires_at: Option<DateTime<Utc>>,
    expire_after_clicks: Option<i64>,
    status: String,
    source: String,
    bulk_batch_id: Option<String>,
    created_at: DateTime<Utc>,
}

fn corrupt(field: &str, reason: String) -> AppError {
    tracing::error!(field, %reason, "Corrupt link row");
    AppError::internal("Database error", json!({}))
}

impl TryFrom<LinkRow> for Link {
    type Error = AppError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        let kind: ExpirationType = row
            .expiration_type
            .parse()
            .map_err(|e| corrupt("expiration_type", e))?;

        let expiration = match (kind, row.expires_at, row.expire_after_clicks) {
            (ExpirationType::None, _, _) => ExpirationPolicy::None,
            (ExpirationType::DateTime, Some(at), _) => ExpirationPolicy::DateTime(at),
            (ExpirationType::Clicks, _, Some(n)) => ExpirationPolicy::Clicks(n),
            _ => return Err(corrupt("expiration", "missing bound".to_string())),
        };

        Ok(Link {
            id: row.id,
            original_url: row.original_url,
            short_code: row.short_code,
            full_short_url: row.full_short_url,
            custom_alias: row.custom_alias,
            session_id: row.session_id,
            domain: row.domain,
            total_clicks: row.total_clicks,
            expiration,
            status: row.status.parse().map_err(|e| corrupt("status", e))?,
            source: row.source.parse().map_err(|e| corrupt("source", e))?,
            bulk_batch_id: row.bulk_batch_id,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: i64,
    link_id: i64,
    clicked_at: DateTime<Utc>,
    ip: Option<String>,
    user_agent: Option<String>,
    device_type: String,
    country_code: String,
    visitor_hash: String,
}

impl From<ClickRow> for Click {
    fn from(row: ClickRow) -> Self {
        Click {
            id: row.id,
            link_id: row.link_id,
            clicked_at: row.clicked_at,
            ip: row.ip,
            user_agent: row.user_agent,
            device_type: row.device_type,
            country_code: row.country_code,
            visitor_hash: row.visitor_hash,
        }
    }
}

fn into_links(rows: Vec<LinkRow>) -> Result<Vec<Link>, AppError> {
    rows.into_iter().map(Link::try_from).collect()
}

/// PostgreSQL repository for links, their click log and visitor sets.
///
/// Click recording runs in one transaction whose guarded `UPDATE` takes the
/// row lock, so concurrent clicks serialize and the click bound cannot be
/// overshot.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(concat!(
            "INSERT INTO links (original_url, short_code, full_short_url, custom_alias, \
             session_id, domain, expiration_type, expires_at, expire_after_clicks, status, \
             source, bulk_batch_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING ",
            link_columns!()
        ))
        .bind(&new_link.original_url)
        .bind(&new_link.short_code)
        .bind(&new_link.full_short_url)
        .bind(&new_link.custom_alias)
        .bind(&new_link.session_id)
        .bind(&new_link.domain)
        .bind(new_link.expiration.kind().as_str())
        .bind(new_link.expiration.expires_at())
        .bind(new_link.expiration.expire_after_clicks())
        .bind(new_link.status.as_str())
        .bind(new_link.source.as_str())
        .bind(&new_link.bulk_batch_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        sqlx::query_as::<_, LinkRow>(concat!(
            "SELECT ",
            link_columns!(),
            " FROM links WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .map(Link::try_from)
        .transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        sqlx::query_as::<_, LinkRow>(concat!(
            "SELECT ",
            link_columns!(),
            " FROM links WHERE short_code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?
        .map(Link::try_from)
        .transpose()
    }

    async fn code_exists(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM links
                WHERE (short_code = $1 OR custom_alias = $1)
                  AND ($2::bigint IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(code)
        .bind(exclude_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn list_by_session(
        &self,
        session_id: &str,
        include_bulk: bool,
    ) -> Result<Vec<Link>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(concat!(
            "SELECT ",
            link_columns!(),
            " FROM links WHERE session_id = $1 AND ($2 OR source <> 'bulk') \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(session_id)
        .bind(include_bulk)
        .fetch_all(self.pool.as_ref())
        .await?;

        into_links(rows)
    }

    async fn delete(&self, id: i64, session_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1 AND session_id = $2")
            .bind(id)
            .bind(session_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, ids: Vec<i64>, session_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE session_id = $1 AND id = ANY($2)")
            .bind(session_id)
            .bind(&ids)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn update_alias(
        &self,
        id: i64,
        session_id: &str,
        alias: &str,
    ) -> Result<Option<Link>, AppError> {
        sqlx::query_as::<_, LinkRow>(concat!(
            "UPDATE links SET short_code = $3, custom_alias = $3, \
             full_short_url = domain || '/' || $3 \
             WHERE id = $1 AND session_id = $2 RETURNING ",
            link_columns!()
        ))
        .bind(id)
        .bind(session_id)
        .bind(alias)
        .fetch_optional(self.pool.as_ref())
        .await?
        .map(Link::try_from)
        .transpose()
    }

    async fn update_expiration(
        &self,
        id: i64,
        session_id: Option<String>,
        policy: ExpirationPolicy,
        status: LinkStatus,
    ) -> Result<Option<Link>, AppError> {
        sqlx::query_as::<_, LinkRow>(concat!(
            "UPDATE links SET expiration_type = $3, expires_at = $4, \
             expire_after_clicks = $5, status = $6 \
             WHERE id = $1 AND ($2::text IS NULL OR session_id = $2) RETURNING ",
            link_columns!()
        ))
        .bind(id)
        .bind(session_id)
        .bind(policy.kind().as_str())
        .bind(policy.expires_at())
        .bind(policy.expire_after_clicks())
        .bind(status.as_str())
        .fetch_optional(self.pool.as_ref())
        .await?
        .map(Link::try_from)
        .transpose()
    }

    async fn mark_expired(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE links SET status = 'expired' WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_click(
        &self,
        click: NewClick,
        now: DateTime<Utc>,
    ) -> Result<Option<Link>, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, LinkRow>(concat!(
            "UPDATE links SET total_clicks = total_clicks + 1 \
             WHERE id = $1 \
               AND status = 'active' \
               AND NOT (expiration_type = 'datetime' AND $2 > expires_at) \
               AND NOT (expiration_type = 'clicks' AND total_clicks >= expire_after_clicks) \
             RETURNING ",
            link_columns!()
        ))
        .bind(click.link_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO link_clicks (link_id, clicked_at, ip, user_agent, device_type, country_code, visitor_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(click.link_id)
        .bind(now)
        .bind(&click.ip)
        .bind(&click.user_agent)
        .bind(click.device_type.as_str())
        .bind(&click.country_code)
        .bind(&click.visitor_hash)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO link_visitors (link_id, visitor_hash) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(click.link_id)
        .bind(&click.visitor_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(row.try_into()?))
    }

    async fn activity_by_session(&self, session_id: &str) -> Result<Vec<LinkActivity>, AppError> {
        let links = into_links(
            sqlx::query_as::<_, LinkRow>(concat!(
                "SELECT ",
                link_columns!(),
                " FROM links WHERE session_id = $1"
            ))
            .bind(session_id)
            .fetch_all(self.pool.as_ref())
            .await?,
        )?;

        let clicks = sqlx::query_as::<_, ClickRow>(
            r#"
            SELECT c.id, c.link_id, c.clicked_at, c.ip, c.user_agent, c.device_type,
                   c.country_code, c.visitor_hash
            FROM link_clicks c
            JOIN links l ON l.id = c.link_id
            WHERE l.session_id = $1
            ORDER BY c.clicked_at
            "#,
        )
        .bind(session_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        let visitors = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT v.link_id, v.visitor_hash
            FROM link_visitors v
            JOIN links l ON l.id = v.link_id
            WHERE l.session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut clicks_by_link: HashMap<i64, Vec<Click>> = HashMap::new();
        for row in clicks {
            clicks_by_link.entry(row.link_id).or_default().push(row.into());
        }

        let mut visitors_by_link: HashMap<i64, Vec<String>> = HashMap::new();
        for (link_id, hash) in visitors {
            visitors_by_link.entry(link_id).or_default().push(hash);
        }

        Ok(links
            .into_iter()
            .map(|link| LinkActivity {
                clicks: clicks_by_link.remove(&link.id).unwrap_or_default(),
                visitors: visitors_by_link.remove(&link.id).unwrap_or_default(),
                link,
            })
            .collect())
    }

    async fn totals(&self) -> Result<LinkTotals, AppError> {
        let (links, active_links, clicks) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'active'),
                   COALESCE(SUM(total_clicks), 0)::bigint
            FROM links
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(LinkTotals {
            links,
            active_links,
            clicks,
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
