//! DTOs for bulk link import.

use serde::{Deserialize, Serialize};

use crate::application::services::{BulkItem, BulkOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateRequest {
    #[serde(default)]
    pub urls: Vec<String>,

    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateResponse {
    pub batch_id: String,
    pub results: Vec<BulkResultItem>,
}

/// Per-URL result, in submission order.
#[derive(Debug, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum BulkResultItem {
    Success {
        original_url: String,
        short_url: String,
    },
    Error {
        original_url: String,
        error: &'static str,
    },
}

impl From<BulkItem> for BulkResultItem {
    fn from(item: BulkItem) -> Self {
        match item {
            BulkItem::Created {
                original_url,
                short_url,
            } => Self::Success {
                original_url,
                short_url,
            },
            BulkItem::Failed {
                original_url,
                error,
            } => Self::Error {
                original_url,
                error,
            },
        }
    }
}

impl From<BulkOutcome> for BulkCreateResponse {
    fn from(outcome: BulkOutcome) -> Self {
        Self {
            batch_id: outcome.batch_id,
            results: outcome.results.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_items_serialize_flat() {
        let response = BulkCreateResponse::from(BulkOutcome {
            batch_id: "b1".to_string(),
            results: vec![
                BulkItem::Created {
                    original_url: "https://a.example/".to_string(),
                    short_url: "http://localhost:3000/abcd1234".to_string(),
                },
                BulkItem::Failed {
                    original_url: "nope".to_string(),
                    error: "Invalid URL format",
                },
            ],
        });

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "batchId": "b1",
                "results": [
                    { "originalUrl": "https://a.example/", "shortUrl": "http://localhost:3000/abcd1234" },
                    { "originalUrl": "nope", "error": "Invalid URL format" }
                ]
            })
        );
    }
}
