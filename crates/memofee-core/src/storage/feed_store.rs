use std::sync::Arc;

use super::kv::{read_collection, write_collection, KeyValueStore};
use crate::feed::Feed;
use crate::Result;

/// Key the subscription list is stored under
pub const FEEDS_KEY: &str = "memofee_feeds";

/// Persisted list of subscribed feeds, keyed by URL
#[derive(Clone)]
pub struct FeedStore {
    kv: Arc<dyn KeyValueStore>,
}

impl FeedStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// All feeds in insertion order
    pub async fn list(&self) -> Result<Vec<Feed>> {
        read_collection(self.kv.as_ref(), FEEDS_KEY).await
    }

    /// Find a feed by ID
    pub async fn find(&self, feed_id: &str) -> Result<Option<Feed>> {
        Ok(self.list().await?.into_iter().find(|f| f.id == feed_id))
    }

    /// Insert a feed, replacing in place any feed with the same URL
    pub async fn upsert(&self, feed: Feed) -> Result<()> {
        let mut feeds = self.list().await?;

        match feeds.iter().position(|f| f.url == feed.url) {
            Some(index) => {
                tracing::debug!("Replacing feed {} at position {}", feed.id, index);
                feeds[index] = feed;
            }
            None => {
                tracing::debug!("Appending feed {}", feed.id);
                feeds.push(feed);
            }
        }

        write_collection(self.kv.as_ref(), FEEDS_KEY, &feeds).await
    }

    /// Delete a feed. Returns false if no feed had this ID.
    pub async fn remove(&self, feed_id: &str) -> Result<bool> {
        let mut feeds = self.list().await?;
        let before = feeds.len();
        feeds.retain(|f| f.id != feed_id);

        if feeds.len() == before {
            return Ok(false);
        }

        write_collection(self.kv.as_ref(), FEEDS_KEY, &feeds).await?;
        Ok(true)
    }
}
