//! Repository trait for user accounts.

use crate::domain::entities::{NewUser, User};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for registered users.
///
/// Emails are stored lowercased; lookups expect an already-normalized address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates an unverified user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Marks the user verified and consumes the verification token.
    async fn mark_verified(&self, id: i64) -> Result<(), AppError>;

    /// Stores a new reset PIN hash, replacing any previous one.
    async fn set_reset_pin(
        &self,
        id: i64,
        pin_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Replaces the password hash and clears the reset PIN.
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}
