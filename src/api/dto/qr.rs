//! DTOs for QR records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::application::services::CreateQr;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQrRequest {
    #[validate(length(min = 1, max = 2048, message = "URL is required"))]
    pub url: String,

    #[validate(length(max = 128))]
    pub password: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,
}

impl From<CreateQrRequest> for CreateQr {
    fn from(req: CreateQrRequest) -> Self {
        Self {
            url: req.url,
            password: req.password,
            expires_at: req.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQrResponse {
    pub uuid: Uuid,
    pub url: String,
    pub scan_url: String,
    pub protected: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ScanQuery {
    pub password: Option<String>,
}
