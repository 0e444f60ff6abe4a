use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::kv::{read_collection, write_collection, KeyValueStore};
use crate::{Error, Result};

/// Key the local note collection is stored under
pub const NOTES_KEY: &str = "memofee_memos";

/// A note attached to one article of one feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Composite item id, `"<feed_id>:<item_guid>"`
    pub id: String,
    pub feed_id: String,
    pub item_guid: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Server-side note record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub item_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Build the composite id the server keys notes by
pub fn item_id(feed_id: &str, item_guid: &str) -> String {
    format!("{}:{}", feed_id, item_guid)
}

/// Split a composite item id at its first ':'.
///
/// Feed ids are hex digests, so any further ':' belongs to the guid.
pub fn split_item_id(item_id: &str) -> Option<(&str, &str)> {
    item_id.split_once(':')
}

/// Timestamp for a new revision that is strictly later than `previous`
pub(crate) fn next_revision_time(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

impl Note {
    fn new(feed_id: &str, item_guid: &str, content: &str) -> Self {
        let now = Utc::now();
        Self {
            id: item_id(feed_id, item_guid),
            feed_id: feed_id.to_string(),
            item_guid: item_guid.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn matches(&self, feed_id: &str, item_guid: &str) -> bool {
        self.feed_id == feed_id && self.item_guid == item_guid
    }
}

impl TryFrom<Memo> for Note {
    type Error = Error;

    fn try_from(memo: Memo) -> Result<Self> {
        let (feed_id, item_guid) = split_item_id(&memo.item_id)
            .ok_or_else(|| Error::Validation(format!("Malformed item id: {}", memo.item_id)))?;

        Ok(Self {
            feed_id: feed_id.to_string(),
            item_guid: item_guid.to_string(),
            id: memo.item_id,
            content: memo.content,
            created_at: memo.created_at,
            updated_at: memo.updated_at,
        })
    }
}

/// Storage for notes, keyed by (feed id, item guid)
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Note>>;

    async fn get(&self, feed_id: &str, item_guid: &str) -> Result<Option<Note>>;

    /// Create the note or replace its content, keeping `created_at`
    async fn upsert(&self, feed_id: &str, item_guid: &str, content: &str) -> Result<Note>;

    /// Delete the note; absent notes are ignored
    async fn remove(&self, feed_id: &str, item_guid: &str) -> Result<()>;

    /// Delete every note belonging to a feed, returning how many were removed
    async fn remove_for_feed(&self, feed_id: &str) -> Result<usize> {
        let doomed: Vec<Note> = self
            .list()
            .await?
            .into_iter()
            .filter(|n| n.feed_id == feed_id)
            .collect();

        for note in &doomed {
            self.remove(&note.feed_id, &note.item_guid).await?;
        }

        Ok(doomed.len())
    }
}

/// Notes kept as a single JSON collection in a [`KeyValueStore`]
#[derive(Clone)]
pub struct LocalNoteStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalNoteStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    async fn load(&self) -> Result<Vec<Note>> {
        read_collection(self.kv.as_ref(), NOTES_KEY).await
    }

    async fn persist(&self, notes: &[Note]) -> Result<()> {
        write_collection(self.kv.as_ref(), NOTES_KEY, notes).await
    }
}

#[async_trait]
impl NoteStore for LocalNoteStore {
    async fn list(&self) -> Result<Vec<Note>> {
        self.load().await
    }

    async fn get(&self, feed_id: &str, item_guid: &str) -> Result<Option<Note>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|n| n.matches(feed_id, item_guid)))
    }

    async fn upsert(&self, feed_id: &str, item_guid: &str, content: &str) -> Result<Note> {
        let mut notes = self.load().await?;

        let note = match notes.iter_mut().find(|n| n.matches(feed_id, item_guid)) {
            Some(existing) => {
                existing.content = content.to_string();
                existing.updated_at = next_revision_time(existing.updated_at);
                existing.clone()
            }
            None => {
                let note = Note::new(feed_id, item_guid, content);
                notes.push(note.clone());
                note
            }
        };

        self.persist(&notes).await?;
        tracing::debug!("Saved note {}", note.id);
        Ok(note)
    }

    async fn remove(&self, feed_id: &str, item_guid: &str) -> Result<()> {
        let mut notes = self.load().await?;
        let before = notes.len();
        notes.retain(|n| !n.matches(feed_id, item_guid));

        if notes.len() != before {
            self.persist(&notes).await?;
        }
        Ok(())
    }

    async fn remove_for_feed(&self, feed_id: &str) -> Result<usize> {
        let mut notes = self.load().await?;
        let before = notes.len();
        notes.retain(|n| n.feed_id != feed_id);

        let removed = before - notes.len();
        if removed > 0 {
            self.persist(&notes).await?;
        }
        Ok(removed)
    }
}
