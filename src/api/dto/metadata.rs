//! Query of the link preview endpoint. The response is
//! [`crate::infrastructure::metadata::MetadataResult`].

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    pub url: Option<String>,
}
