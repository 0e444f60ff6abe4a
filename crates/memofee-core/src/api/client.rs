//! HTTP client for a running MemoFee server
//!
//! Provides a typed interface over the memo and feed endpoints, plus
//! [`RemoteNoteStore`], which lets the server stand in for the local note file.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use url::Url;

use super::protocol::*;
use crate::config::AppConfig;
use crate::feed::{validate_url, Feed, FeedSource};
use crate::storage::{item_id, Memo, Note, NoteStore};
use crate::{Error, Result};

/// Client for communicating with the server
#[derive(Clone)]
pub struct MemoFeeClient {
    base_url: Url,
    http: Client,
}

impl MemoFeeClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(&validate_url(base_url)?)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            http: Client::new(),
        })
    }

    /// Create a client for the server named in the configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.notes.server_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check the server is up
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.send(self.http.get(self.endpoint(paths::HEALTH)?)).await?;
        if !response.status().is_success() {
            return Err(failure(response, Error::Transport).await);
        }
        Ok(response.json().await?)
    }

    /// List all memos
    pub async fn list_memos(&self) -> Result<Vec<Memo>> {
        let response = self.send(self.http.get(self.endpoint(paths::MEMO)?)).await?;
        if !response.status().is_success() {
            return Err(failure(response, Error::Persistence).await);
        }
        Ok(response.json().await?)
    }

    /// Get the memo for an item, if one exists
    pub async fn get_memo(&self, item_id: &str) -> Result<Option<Memo>> {
        let response = self.send(self.http.get(self.memo_url(item_id)?)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(failure(response, Error::Persistence).await),
        }
    }

    /// Create or overwrite the memo for an item
    pub async fn save_memo(&self, item_id: &str, content: &str) -> Result<Memo> {
        let request = self
            .http
            .post(self.endpoint(paths::MEMO)?)
            .json(&SaveMemoRequest::new(item_id, content));

        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(failure(response, Error::Persistence).await);
        }
        Ok(response.json().await?)
    }

    /// Delete the memo for an item. Returns false if the server had none.
    pub async fn delete_memo(&self, item_id: &str) -> Result<bool> {
        let response = self.send(self.http.delete(self.memo_url(item_id)?)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(failure(response, Error::Persistence).await),
        }
    }

    /// Have the server retrieve and parse a feed
    pub async fn fetch_feed(&self, url: &str) -> Result<Feed> {
        let request = self
            .http
            .post(self.endpoint(paths::RSS_FETCH)?)
            .json(&FetchFeedRequest {
                url: Some(url.to_string()),
            });

        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(failure(response, Error::Transport).await);
        }
        Ok(response.json().await?)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// URL of one memo, with the item id encoded as a single path segment
    fn memo_url(&self, item_id: &str) -> Result<Url> {
        let mut url = self.endpoint(paths::MEMO)?;
        url.path_segments_mut()
            .map_err(|_| Error::Validation(format!("Cannot address memos under {}", self.base_url)))?
            .pop_if_empty()
            .push(item_id);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| {
            Error::Transport(format!(
                "Failed to reach MemoFee server at {}: {}",
                self.base_url, e
            ))
        })
    }
}

#[async_trait]
impl FeedSource for MemoFeeClient {
    async fn fetch(&self, url: &str) -> Result<Feed> {
        let url = validate_url(url)?;
        tracing::info!("Fetching feed via {}: {}", self.base_url, url);
        self.fetch_feed(&url).await
    }
}

/// Turn a failed response into an error.
///
/// 400 always means the request was invalid; anything else is reported with
/// `other`. The server's `{error}` message is carried when present.
async fn failure(response: Response, other: fn(String) -> Error) -> Error {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("Server responded with HTTP {}", status),
    };

    if status == StatusCode::BAD_REQUEST {
        Error::Validation(message)
    } else {
        other(message)
    }
}

/// Notes stored on a MemoFee server
#[derive(Clone)]
pub struct RemoteNoteStore {
    client: MemoFeeClient,
}

impl RemoteNoteStore {
    pub fn new(client: MemoFeeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NoteStore for RemoteNoteStore {
    async fn list(&self) -> Result<Vec<Note>> {
        let memos = self.client.list_memos().await?;
        let mut notes = Vec::with_capacity(memos.len());

        for memo in memos {
            match Note::try_from(memo) {
                Ok(note) => notes.push(note),
                Err(e) => tracing::warn!("Skipping memo: {}", e),
            }
        }

        Ok(notes)
    }

    async fn get(&self, feed_id: &str, item_guid: &str) -> Result<Option<Note>> {
        self.client
            .get_memo(&item_id(feed_id, item_guid))
            .await?
            .map(Note::try_from)
            .transpose()
    }

    async fn upsert(&self, feed_id: &str, item_guid: &str, content: &str) -> Result<Note> {
        let memo = self
            .client
            .save_memo(&item_id(feed_id, item_guid), content)
            .await?;
        Note::try_from(memo)
    }

    async fn remove(&self, feed_id: &str, item_guid: &str) -> Result<()> {
        let id = item_id(feed_id, item_guid);
        if !self.client.delete_memo(&id).await? {
            tracing::debug!("No memo to delete for {}", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn memo_json(item_id: &str, content: &str) -> serde_json::Value {
        let now = Utc::now().to_rfc3339();
        json!({ "itemId": item_id, "content": content, "createdAt": now, "updatedAt": now })
    }

    async fn store_for(server: &MockServer) -> RemoteNoteStore {
        RemoteNoteStore::new(MemoFeeClient::new(&server.uri()).unwrap())
    }

    #[test]
    fn test_memo_url_encodes_guid_as_one_segment() {
        let client = MemoFeeClient::new("http://127.0.0.1:8000").unwrap();
        let url = client.memo_url("f1:http://e.test/a?b=c").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/api/memo/f1:http:%2F%2Fe.test%2Fa%3Fb=c"
        );
    }

    #[test]
    fn test_base_url_with_prefix_is_kept() {
        let client = MemoFeeClient::new("http://host.test/memofee").unwrap();
        assert_eq!(
            client.endpoint(paths::HEALTH).unwrap().as_str(),
            "http://host.test/memofee/api/health"
        );
        assert!(MemoFeeClient::new("ftp://host.test").is_err());
    }

    #[tokio::test]
    async fn test_get_missing_note_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/memo/f1:g1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Memo not found" })))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        assert!(store.get("f1", "g1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_sends_composite_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/memo"))
            .and(body_json(json!({ "itemId": "f1:g1", "content": "hello" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(memo_json("f1:g1", "hello")))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let note = store.upsert("f1", "g1", "hello").await.unwrap();
        assert_eq!(note.feed_id, "f1");
        assert_eq!(note.item_guid, "g1");
        assert_eq!(note.content, "hello");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/memo"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "content is required" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/memo"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "Failed to load memos" })))
            .mount(&server)
            .await;

        let store = store_for(&server).await;

        let err = store.upsert("f1", "g1", "x").await.unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m == "content is required"));

        let err = store.list().await.unwrap_err();
        assert!(matches!(err, Error::Persistence(ref m) if m == "Failed to load memos"));
    }

    #[tokio::test]
    async fn test_remove_missing_note_is_noop() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/memo/f1:g1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Memo not found" })))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        store.remove("f1", "g1").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_skips_malformed_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/memo"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([memo_json("f1:g1", "a"), memo_json("legacy", "b")])),
            )
            .mount(&server)
            .await;

        let notes = store_for(&server).await.list().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "f1:g1");
    }

    #[tokio::test]
    async fn test_remote_fetch_failure_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rss/fetch"))
            .respond_with(ResponseTemplate::new(500).set_body_json(
                json!({ "error": "Failed to fetch RSS feed: HTTP 404 Not Found for URL: http://x.test" }),
            ))
            .mount(&server)
            .await;

        let client = MemoFeeClient::new(&server.uri()).unwrap();
        let err = client.fetch("http://x.test").await.unwrap_err();
        assert!(matches!(err, Error::Transport(ref m) if m.starts_with("Failed to fetch RSS feed")));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let client = MemoFeeClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(client.list_memos().await, Err(Error::Transport(_))));
    }
}
