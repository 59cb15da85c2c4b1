//! PostgreSQL implementation of QR repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{NewQrCode, QrCode};
use crate::domain::repositories::QrRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct QrRow {
    id: i64,
    uuid: Uuid,
    url: String,
    password_hash: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    scans: i64,
    created_at: DateTime<Utc>,
}

impl From<QrRow> for QrCode {
    fn from(row: QrRow) -> Self {
        QrCode {
            id: row.id,
            uuid: row.uuid,
            url: row.url,
            password_hash: row.password_hash,
            expires_at: row.expires_at,
            scans: row.scans,
            created_at: row.created_at,
        }
    }
}

pub struct PgQrRepository {
    pool: Arc<PgPool>,
}

impl PgQrRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QrRepository for PgQrRepository {
    async fn create(&self, new_qr: NewQrCode) -> Result<QrCode, AppError> {
        let row = sqlx::query_as::<_, QrRow>(
            r#"
            INSERT INTO qr_codes (uuid, url, password_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, uuid, url, password_hash, expires_at, scans, created_at
            "#,
        )
        .bind(new_qr.uuid)
        .bind(&new_qr.url)
        .bind(&new_qr.password_hash)
        .bind(new_qr.expires_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<QrCode>, AppError> {
        let row = sqlx::query_as::<_, QrRow>(
            r#"
            SELECT id, uuid, url, password_hash, expires_at, scans, created_at
            FROM qr_codes
            WHERE uuid = $1
            "#,
        )
        .bind(uuid)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(QrCode::from))
    }

    async fn record_scan(&self, uuid: Uuid) -> Result<Option<i64>, AppError> {
        let scans = sqlx::query_scalar::<_, i64>(
            "UPDATE qr_codes SET scans = scans + 1 WHERE uuid = $1 RETURNING scans",
        )
        .bind(uuid)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(scans)
    }
}
