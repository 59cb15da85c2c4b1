//! QR code records and scan resolution.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::{NewQrCode, QrCode};
use crate::domain::repositories::QrRepository;
use crate::error::AppError;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::url_validator::parse_destination;

#[derive(Debug, Clone, Default)]
pub struct CreateQr {
    pub url: String,
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Service for QR targets. Image rendering is left to clients.
pub struct QrService<R: QrRepository + ?Sized> {
    repository: Arc<R>,
    base_url: String,
}

impl<R: QrRepository + ?Sized> QrService<R> {
    pub fn new(repository: Arc<R>, base_url: impl Into<String>) -> Self {
        Self {
            repository,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL encoded into the QR image.
    pub fn scan_url(&self, uuid: Uuid) -> String {
        format!("{}/api/qr/scan/{}", self.base_url, uuid)
    }

    /// Stores a new QR target. An empty password means unprotected.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed URL or a past expiry.
    pub async fn create(&self, input: CreateQr) -> Result<QrCode, AppError> {
        parse_destination(&input.url)?;

        if input.expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(AppError::bad_request(
                "Expiration date must be in the future",
                json!({ "field": "expiresAt" }),
            ));
        }

        let password_hash = match input.password.as_deref() {
            Some(p) if !p.is_empty() => Some(hash_password(p)?),
            _ => None,
        };

        let qr = self
            .repository
            .create(NewQrCode {
                uuid: Uuid::new_v4(),
                url: input.url,
                password_hash,
                expires_at: input.expires_at,
            })
            .await?;

        tracing::info!(uuid = %qr.uuid, protected = qr.is_protected(), "QR code created");
        Ok(qr)
    }

    /// Counts a scan and returns the target URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown UUID.
    /// Returns [`AppError::Gone`] once the QR code has expired.
    /// Returns [`AppError::Unauthorized`] if a protected code gets no or a wrong password.
    pub async fn scan(&self, uuid: Uuid, password: Option<&str>) -> Result<String, AppError> {
        let not_found = || AppError::not_found("QR code not found", json!({ "uuid": uuid }));

        let qr = self
            .repository
            .find_by_uuid(uuid)
            .await?
            .ok_or_else(not_found)?;

        if qr.is_expired_at(Utc::now()) {
            return Err(AppError::gone("QR code expired", json!({ "uuid": uuid })));
        }

        if let Some(hash) = qr.password_hash.as_deref() {
            match password {
                None | Some("") => {
                    return Err(AppError::unauthorized("Password required", json!({})));
                }
                Some(p) if !verify_password(p, hash) => {
                    return Err(AppError::unauthorized("Invalid password", json!({})));
                }
                Some(_) => {}
            }
        }

        let scans = self
            .repository
            .record_scan(uuid)
            .await?
            .ok_or_else(not_found)?;

        tracing::debug!(uuid = %uuid, scans, "QR scanned");
        Ok(qr.url)
    }
}
