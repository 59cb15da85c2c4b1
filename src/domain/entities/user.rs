//! User account entity.

use chrono::{DateTime, Utc};

/// A registered account.
///
/// One-time secrets (verification token, reset PIN) are stored only as keyed
/// hashes; the plaintext leaves the process exactly once, by email.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub verification_token_hash: Option<String>,
    pub reset_pin_hash: Option<String>,
    pub reset_pin_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns true when a reset PIN is stored and has not yet run out.
    pub fn has_live_reset_pin(&self, now: DateTime<Utc>) -> bool {
        self.reset_pin_hash.is_some() && self.reset_pin_expires_at.is_some_and(|exp| now <= exp)
    }
}

/// Input data for registering a user. New accounts start unverified.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub email: String,
    pub password_hash: String,
    pub verification_token_hash: String,
}
