//! Request and response bodies of the MemoFee HTTP API
//!
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

// Route paths
pub mod paths {
    pub const MEMO: &str = "/api/memo";
    pub const MEMO_ITEM: &str = "/api/memo/:item_id";
    pub const RSS_FETCH: &str = "/api/rss/fetch";
    pub const HEALTH: &str = "/api/health";
}

/// Body of `POST /api/memo`.
///
/// Fields are optional so that a missing field is reported as a validation
/// failure rather than a decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMemoRequest {
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl SaveMemoRequest {
    pub fn new(item_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            item_id: Some(item_id.into()),
            content: Some(content.into()),
        }
    }
}

/// Body of `POST /api/rss/fetch`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchFeedRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Body of every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of a successful delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
