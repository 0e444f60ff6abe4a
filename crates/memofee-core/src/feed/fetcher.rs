use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use url::Url;

use super::models::Feed;
use super::parser::parse_feed;
use crate::config::AppConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const FEED_USER_AGENT: &str = concat!("MemoFee/", env!("CARGO_PKG_VERSION"));
const FEED_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.9, */*;q=0.8";

/// Anything that can turn a feed URL into a normalized [`Feed`]
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Feed>;
}

/// Check that `url` is an absolute http(s) URL and return it trimmed
pub fn validate_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::Validation("RSS feed URL is required".to_string()));
    }

    let parsed = Url::parse(url)
        .map_err(|_| Error::Validation(format!("Not a valid URL: {}", url)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(url.to_string()),
        scheme => Err(Error::Validation(format!(
            "Unsupported URL scheme '{}': only http and https feeds are allowed",
            scheme
        ))),
    }
}

/// Retrieves feeds directly over HTTP
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Self::build_client(
            config.fetch.request_timeout_secs,
            config.fetch.max_redirects,
        )?;

        Ok(Self { client })
    }

    fn build_client(timeout_secs: u64, max_redirects: usize) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .default_headers(Self::build_headers())
            .build()
            .map_err(Error::Http)
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(FEED_ACCEPT));
        headers.insert(USER_AGENT, HeaderValue::from_static(FEED_USER_AGENT));
        headers
    }

    /// Retrieve the raw feed document; one attempt, no retries
    async fn retrieve(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("HTTP {} for URL: {}", status, url)));
        }

        if let Some(length) = response.content_length() {
            self.ensure_content_size(length as usize, url)?;
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response body from {}: {}", url, e)))?;
        self.ensure_content_size(bytes.len(), url)?;

        Ok(bytes)
    }

    fn ensure_content_size(&self, size: usize, url: &str) -> Result<()> {
        if size > MAX_FEED_BYTES {
            return Err(Error::Transport(format!(
                "Feed too large ({} bytes) for URL: {}",
                size,
                url
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Feed> {
        let url = validate_url(url)?;

        tracing::info!("Fetching feed from: {}", url);

        let content = self.retrieve(&url).await?;
        let feed = parse_feed(&content, &url)?;

        tracing::info!(
            "Fetched feed '{}' ({} items) from {}",
            feed.title,
            feed.items.len(),
            url
        );

        Ok(feed)
    }
}
