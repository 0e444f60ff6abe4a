use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the URL digest (128 bits)
pub const FEED_ID_LEN: usize = 32;

/// Represents a subscribed RSS/Atom feed together with its articles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub items: Vec<Article>,
    pub last_updated: DateTime<Utc>,
}

/// Represents one entry within a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
    pub guid: String,
}

impl Article {
    /// Build an article, resolving the identifier from the item's guid, then its
    /// link, then `"{title}_{pub_date}"`.
    pub fn new(
        title: Option<String>,
        link: Option<String>,
        description: String,
        pub_date: Option<String>,
        guid: Option<String>,
    ) -> Self {
        let guid = non_blank(guid)
            .or_else(|| non_blank(link.clone()))
            .unwrap_or_else(|| {
                format!(
                    "{}_{}",
                    title.as_deref().unwrap_or_default(),
                    pub_date.as_deref().unwrap_or_default()
                )
            });

        Self {
            title: non_blank(title).unwrap_or_else(|| "Untitled".to_string()),
            link: link.unwrap_or_default(),
            description,
            pub_date: pub_date.unwrap_or_default(),
            guid,
        }
    }
}

impl Feed {
    /// Find an article by its guid
    pub fn article(&self, guid: &str) -> Option<&Article> {
        self.items.iter().find(|a| a.guid == guid)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Derive the feed identifier from its URL.
///
/// Deterministic: the same URL always yields the same id, so re-fetching a feed
/// replaces the stored entry instead of duplicating it.
pub fn feed_id_for_url(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(FEED_ID_LEN);
    id
}
