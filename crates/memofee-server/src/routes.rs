//! Axum route handlers for the memo and feed API.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use memofee_core::api::{FetchFeedRequest, HealthResponse, MessageBody, SaveMemoRequest};
use memofee_core::feed::{validate_url, Feed, FeedSource};
use memofee_core::storage::Memo;
use memofee_core::Error;

use crate::error::ApiError;
use crate::ServerState;

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

const MEMO_NOT_FOUND: &str = "Memo not found";

// GET /api/memo
pub async fn list_memos(State(state): State<Arc<ServerState>>) -> ApiResult<Vec<Memo>> {
    let memos = state
        .memos
        .list()
        .await
        .map_err(|e| ApiError::internal("Failed to load memos", e))?;
    Ok(Json(memos))
}

// GET /api/memo/:item_id
pub async fn get_memo(
    State(state): State<Arc<ServerState>>,
    Path(item_id): Path<String>,
) -> ApiResult<Memo> {
    state
        .memos
        .get(&item_id)
        .await
        .map_err(|e| ApiError::internal("Failed to load memos", e))?
        .map(Json)
        .ok_or_else(|| Error::NotFound(MEMO_NOT_FOUND.to_string()).into())
}

// POST /api/memo
pub async fn save_memo(
    State(state): State<Arc<ServerState>>,
    payload: std::result::Result<Json<SaveMemoRequest>, JsonRejection>,
) -> ApiResult<Memo> {
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))?;

    let item_id = request
        .item_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("itemId is required"))?;
    let content = request
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("content is required"))?;

    let memo = state
        .memos
        .save(&item_id, &content)
        .await
        .map_err(|e| ApiError::internal("Failed to save memo", e))?;

    tracing::debug!("Saved memo {}", memo.item_id);
    Ok(Json(memo))
}

// DELETE /api/memo/:item_id
pub async fn delete_memo(
    State(state): State<Arc<ServerState>>,
    Path(item_id): Path<String>,
) -> ApiResult<MessageBody> {
    let deleted = state
        .memos
        .delete(&item_id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete memo", e))?;

    if !deleted {
        return Err(Error::NotFound(MEMO_NOT_FOUND.to_string()).into());
    }

    tracing::debug!("Deleted memo {}", item_id);
    Ok(Json(MessageBody {
        message: "Memo deleted".to_string(),
    }))
}

// POST /api/rss/fetch
pub async fn fetch_feed(
    State(state): State<Arc<ServerState>>,
    payload: std::result::Result<Json<FetchFeedRequest>, JsonRejection>,
) -> ApiResult<Feed> {
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))?;

    let url = request
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("RSS feed URL is required"))?;
    let url = validate_url(&url)?;

    match state.fetcher.fetch(&url).await {
        Ok(feed) => Ok(Json(feed)),
        Err(e) if e.is_validation() => Err(e.into()),
        Err(e) => Err(ApiError::internal("Failed to fetch RSS feed", e)),
    }
}

// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
