//! PostgreSQL implementation of user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    first_name: String,
    email: String,
    password_hash: String,
    is_verified: bool,
    verification_token_hash: Option<String>,
    reset_pin_hash: Option<String>,
    reset_pin_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            first_name: row.first_name,
            email: row.email,
            password_hash: row.password_hash,
            is_verified: row.is_verified,
            verification_token_hash: row.verification_token_hash,
            reset_pin_hash: row.reset_pin_hash,
            reset_pin_expires_at: row.reset_pin_expires_at,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL repository for user accounts.
///
/// Verification tokens and reset PINs arrive already hashed; plaintext
/// secrets never reach this layer.
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (first_name, email, password_hash, verification_token_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, first_name, email, password_hash, is_verified,
                      verification_token_hash, reset_pin_hash, reset_pin_expires_at, created_at
            "#,
        )
        .bind(&new_user.first_name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.verification_token_hash)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, email, password_hash, is_verified,
                   verification_token_hash, reset_pin_hash, reset_pin_expires_at, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, email, password_hash, is_verified,
                   verification_token_hash, reset_pin_hash, reset_pin_expires_at, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(User::from))
    }

    async fn mark_verified(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET is_verified = TRUE, verification_token_hash = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn set_reset_pin(
        &self,
        id: i64,
        pin_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET reset_pin_hash = $2, reset_pin_expires_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(pin_hash)
        .bind(expires_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_pin_hash = NULL, reset_pin_expires_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
