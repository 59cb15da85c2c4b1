//! Repository trait for QR code records.

use crate::domain::entities::{NewQrCode, QrCode};
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QrRepository: Send + Sync {
    async fn create(&self, new_qr: NewQrCode) -> Result<QrCode, AppError>;

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<QrCode>, AppError>;

    /// Atomically increments the scan counter and returns the new value.
    ///
    /// Returns `Ok(None)` if the record does not exist.
    async fn record_scan(&self, uuid: Uuid) -> Result<Option<i64>, AppError>;
}
