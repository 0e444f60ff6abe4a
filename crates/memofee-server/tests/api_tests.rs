use std::path::PathBuf;
use std::sync::Arc;

use memofee_core::feed::feed_id_for_url;
use memofee_core::storage::{FeedStore, MemoryKv, NoteStore};
use memofee_core::{AppConfig, Coordinator, MemoFeeClient, RemoteNoteStore};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDEX_HTML: &str = "<!doctype html><title>MemoFee</title>";

struct TestServer {
    base: String,
    data_dir: PathBuf,
    http: reqwest::Client,
    _dir: TempDir,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let static_dir = dir.path().join("public");
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(static_dir.join("index.html"), INDEX_HTML).unwrap();
        std::fs::write(static_dir.join("app.js"), "console.log('memofee');").unwrap();

        let mut config = AppConfig::default();
        config.general.data_dir = dir.path().join("data");
        config.server.static_dir = static_dir;
        let data_dir = config.data_dir();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            memofee_server::serve_on(listener, &config, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            base,
            data_dir,
            http: reqwest::Client::new(),
            _dir: dir,
            _shutdown: tx,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn client(&self) -> MemoFeeClient {
        MemoFeeClient::new(&self.base).unwrap()
    }
}

async fn rss_upstream() -> MockServer {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Upstream</title>
    <description>A test feed</description>
    <item>
      <title>First</title>
      <link>http://upstream.test/1</link>
      <description>&lt;p&gt;Hello &amp;amp; welcome&lt;/p&gt;</description>
      <pubDate>Mon, 21 Oct 2024 07:28:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#,
        ))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;
    upstream
}

#[tokio::test]
async fn test_memo_lifecycle() {
    let server = TestServer::start().await;

    let listed: Value = server.http.get(server.url("/api/memo")).send().await.unwrap().json().await.unwrap();
    assert_eq!(listed, json!([]));

    let response = server
        .http
        .post(server.url("/api/memo"))
        .json(&json!({ "itemId": "f1:g1", "content": "first" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["itemId"], "f1:g1");
    assert_eq!(created["createdAt"], created["updatedAt"]);

    let updated: Value = server
        .http
        .post(server.url("/api/memo"))
        .json(&json!({ "itemId": "f1:g1", "content": "second" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_ne!(updated["updatedAt"], created["updatedAt"]);

    let fetched: Value = server
        .http
        .get(server.url("/api/memo/f1:g1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["content"], "second");

    let response = server.http.delete(server.url("/api/memo/f1:g1")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());

    let response = server.http.delete(server.url("/api/memo/f1:g1")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());

    let response = server.http.get(server.url("/api/memo/f1:g1")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let raw = std::fs::read_to_string(server.data_dir.join("memos.json")).unwrap();
    assert_eq!(serde_json::from_str::<Value>(&raw).unwrap(), json!([]));
}

#[tokio::test]
async fn test_save_memo_validation() {
    let server = TestServer::start().await;

    let cases = [
        json!({ "content": "no id" }),
        json!({ "itemId": "", "content": "empty id" }),
        json!({ "itemId": "f1:g1" }),
        json!({ "itemId": "f1:g1", "content": "" }),
        json!({ "itemId": 42, "content": "wrong type" }),
    ];

    for body in cases {
        let response = server.http.post(server.url("/api/memo")).json(&body).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
        let error: Value = response.json().await.unwrap();
        assert!(error["error"].is_string());
    }

    let response = server
        .http
        .post(server.url("/api/memo"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(!server.data_dir.join("memos.json").exists());
}

#[tokio::test]
async fn test_corrupt_memo_file_is_server_error() {
    let server = TestServer::start().await;
    std::fs::create_dir_all(&server.data_dir).unwrap();
    std::fs::write(server.data_dir.join("memos.json"), "[{ broken").unwrap();

    let response = server.http.get(server.url("/api/memo")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Failed to load memos"));
}

#[tokio::test]
async fn test_remote_note_store_round_trip() {
    let server = TestServer::start().await;
    let store = RemoteNoteStore::new(server.client());
    let guid = "http://e.test/posts/1?ref=rss";

    assert!(store.get("f1", guid).await.unwrap().is_none());

    let first = store.upsert("f1", guid, "remember this").await.unwrap();
    let second = store.upsert("f1", guid, "and this").await.unwrap();
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);

    let note = store.get("f1", guid).await.unwrap().unwrap();
    assert_eq!(note.item_guid, guid);
    assert_eq!(note.content, "and this");
    assert_eq!(store.list().await.unwrap().len(), 1);

    store.remove("f1", guid).await.unwrap();
    assert!(store.get("f1", guid).await.unwrap().is_none());
    store.remove("f1", guid).await.unwrap();
}

#[tokio::test]
async fn test_fetch_feed() {
    let server = TestServer::start().await;
    let upstream = rss_upstream().await;
    let feed_url = format!("{}/feed.xml", upstream.uri());

    let response = server
        .http
        .post(server.url("/api/rss/fetch"))
        .json(&json!({ "url": feed_url }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let feed: Value = response.json().await.unwrap();
    assert_eq!(feed["id"], feed_id_for_url(&feed_url));
    assert_eq!(feed["title"], "Upstream");
    assert_eq!(feed["description"], "A test feed");
    assert_eq!(feed["items"][0]["guid"], "http://upstream.test/1");
    assert_eq!(feed["items"][0]["description"], "Hello & welcome");
    assert_eq!(feed["items"][0]["pubDate"], "Mon, 21 Oct 2024 07:28:00 GMT");
    assert!(feed["lastUpdated"].is_string());
}

#[tokio::test]
async fn test_fetch_feed_errors() {
    let server = TestServer::start().await;
    let upstream = rss_upstream().await;

    for body in [json!({}), json!({ "url": "" }), json!({ "url": "ftp://example.com" }), json!({ "url": "not a url" })] {
        let response = server.http.post(server.url("/api/rss/fetch")).json(&body).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
    }

    let response = server
        .http
        .post(server.url("/api/rss/fetch"))
        .json(&json!({ "url": format!("{}/missing.xml", upstream.uri()) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Failed to fetch RSS feed: "), "{}", message);
    assert!(message.contains("404"), "{}", message);
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let health = server.client().health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn test_static_client_and_fallback() {
    let server = TestServer::start().await;

    let script = server.http.get(server.url("/app.js")).send().await.unwrap();
    assert_eq!(script.status(), StatusCode::OK);
    assert!(script.text().await.unwrap().contains("memofee"));

    for route in ["/", "/feeds/abc", "/does/not/exist.html"] {
        let response = server.http.get(server.url(route)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "route {}", route);
        assert_eq!(response.text().await.unwrap(), INDEX_HTML);
    }
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = TestServer::start().await;
    let response = server
        .http
        .get(server.url("/api/memo"))
        .header("origin", "http://elsewhere.test")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_remote_session_removing_feed_deletes_its_notes() {
    let server = TestServer::start().await;
    let upstream = rss_upstream().await;
    let feed_url = format!("{}/feed.xml", upstream.uri());
    let feed_id = feed_id_for_url(&feed_url);

    let client = server.client();
    let coordinator = Coordinator::new(
        FeedStore::new(Arc::new(MemoryKv::new())),
        Arc::new(RemoteNoteStore::new(client.clone())),
        Arc::new(client.clone()),
    );

    let state = coordinator.add_feed(&feed_url).await.unwrap();
    assert_eq!(state.feeds.len(), 1);
    let guid = state.feeds[0].items[0].guid.clone();

    coordinator.save_note(&feed_id, &guid, "keep me").await.unwrap();
    coordinator.save_note("other-feed", "x", "unrelated").await.unwrap();

    let state = coordinator.remove_feed(&feed_id).await.unwrap();
    assert!(state.feeds.is_empty());
    assert_eq!(state.notes.len(), 1);
    assert_eq!(client.list_memos().await.unwrap()[0].item_id, "other-feed:x");
}
