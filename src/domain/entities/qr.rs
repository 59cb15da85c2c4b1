//! QR code record, independent of links.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A scannable QR target with an optional password and expiry.
#[derive(Debug, Clone)]
pub struct QrCode {
    pub id: i64,
    pub uuid: Uuid,
    pub url: String,
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scans: i64,
    pub created_at: DateTime<Utc>,
}

impl QrCode {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }

    pub fn is_protected(&self) -> bool {
        self.password_hash.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewQrCode {
    pub uuid: Uuid,
    pub url: String,
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}
