//! Process-local QR repository.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::lock;
use crate::domain::entities::{NewQrCode, QrCode};
use crate::domain::repositories::QrRepository;
use crate::error::AppError;

#[derive(Default)]
struct QrStore {
    next_id: i64,
    codes: HashMap<Uuid, QrCode>,
}

#[derive(Default)]
pub struct InMemoryQrRepository {
    store: Mutex<QrStore>,
}

impl InMemoryQrRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QrRepository for InMemoryQrRepository {
    async fn create(&self, new_qr: NewQrCode) -> Result<QrCode, AppError> {
        let mut store = lock(&self.store)?;

        if store.codes.contains_key(&new_qr.uuid) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "qr_codes_uuid_key" }),
            ));
        }

        store.next_id += 1;
        let qr = QrCode {
            id: store.next_id,
            uuid: new_qr.uuid,
            url: new_qr.url,
            password_hash: new_qr.password_hash,
            expires_at: new_qr.expires_at,
            scans: 0,
            created_at: Utc::now(),
        };
        store.codes.insert(qr.uuid, qr.clone());
        Ok(qr)
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<QrCode>, AppError> {
        Ok(lock(&self.store)?.codes.get(&uuid).cloned())
    }

    async fn record_scan(&self, uuid: Uuid) -> Result<Option<i64>, AppError> {
        let mut store = lock(&self.store)?;
        Ok(store.codes.get_mut(&uuid).map(|qr| {
            qr.scans += 1;
            qr.scans
        }))
    }
}
