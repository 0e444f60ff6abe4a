use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::api::{MemoFeeClient, RemoteNoteStore};
use crate::config::{AppConfig, NoteBackend};
use crate::feed::{validate_url, Feed, FeedFetcher, FeedSource};
use crate::storage::{FeedStore, JsonFileKv, KeyValueStore, LocalNoteStore, Note, NoteStore};
use crate::{Error, Result};

/// The article the session is looking at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedItem {
    pub feed_id: String,
    pub item_guid: String,
}

/// Immutable view of everything the presentation layer renders
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub feeds: Vec<Feed>,
    pub notes: Vec<Note>,
    pub selected_item: Option<SelectedItem>,
}

impl AppState {
    pub fn note_for(&self, feed_id: &str, item_guid: &str) -> Option<&Note> {
        self.notes
            .iter()
            .find(|n| n.feed_id == feed_id && n.item_guid == item_guid)
    }
}

/// Outcome of [`Coordinator::select`]
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Still the latest selection; `note` is `None` when the article has no note
    Current {
        item: SelectedItem,
        note: Option<Note>,
    },
    /// A newer selection was made while the note was being looked up
    Superseded,
}

#[derive(Default)]
struct SelectionSlot {
    generation: u64,
    item: Option<SelectedItem>,
}

/// Mediates between the presentation layer and the stores
pub struct Coordinator {
    feeds: FeedStore,
    notes: Arc<dyn NoteStore>,
    source: Arc<dyn FeedSource>,
    fetch_gate: Mutex<()>,
    selection: Mutex<SelectionSlot>,
}

impl Coordinator {
    pub fn new(feeds: FeedStore, notes: Arc<dyn NoteStore>, source: Arc<dyn FeedSource>) -> Self {
        Self {
            feeds,
            notes,
            source,
            fetch_gate: Mutex::new(()),
            selection: Mutex::new(SelectionSlot::default()),
        }
    }

    /// Wire up the stores named by the configuration.
    ///
    /// Feeds always live in the data directory. With the remote backend, notes
    /// and feed retrieval go through the configured server.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(JsonFileKv::new(config.data_dir()));
        let feeds = FeedStore::new(kv.clone());

        let coordinator = match config.notes.backend {
            NoteBackend::Local => {
                tracing::debug!("Using local notes in {}", config.data_dir().display());
                Self::new(
                    feeds,
                    Arc::new(LocalNoteStore::new(kv)),
                    Arc::new(FeedFetcher::new(config)?),
                )
            }
            NoteBackend::Remote => {
                let client = MemoFeeClient::from_config(config)?;
                tracing::debug!("Using notes on {}", client.base_url());
                Self::new(
                    feeds,
                    Arc::new(RemoteNoteStore::new(client.clone())),
                    Arc::new(client),
                )
            }
        };

        Ok(coordinator)
    }

    /// Current feeds and notes, without any selection
    pub async fn snapshot(&self) -> Result<AppState> {
        Ok(AppState {
            feeds: self.feeds.list().await?,
            notes: self.notes.list().await?,
            selected_item: None,
        })
    }

    /// A subscribed feed by ID
    pub async fn feed(&self, feed_id: &str) -> Result<Feed> {
        self.feeds
            .find(feed_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Feed '{}' not found", feed_id)))
    }

    /// Fetch a feed and subscribe to it, replacing any feed with the same URL.
    ///
    /// Only one fetch runs at a time; a call made while another is in flight
    /// fails with [`Error::FetchInProgress`].
    pub async fn add_feed(&self, url: &str) -> Result<AppState> {
        let url = validate_url(url)?;
        let _gate = self.fetch_gate.try_lock().map_err(|_| Error::FetchInProgress)?;

        let feed = self.source.fetch(&url).await?;
        tracing::info!("Subscribed to '{}' ({})", feed.title, feed.id);
        self.feeds.upsert(feed).await?;

        self.state().await
    }

    /// Unsubscribe from a feed and delete its notes
    pub async fn remove_feed(&self, feed_id: &str) -> Result<AppState> {
        if !self.feeds.remove(feed_id).await? {
            tracing::debug!("Feed {} was not subscribed", feed_id);
        }

        let removed = self.notes.remove_for_feed(feed_id).await?;
        if removed > 0 {
            tracing::info!("Deleted {} notes of feed {}", removed, feed_id);
        }

        self.state().await
    }

    /// Select an article and look up its note.
    ///
    /// The selection is recorded before the lookup starts. If another select
    /// (or a clear) happens before the lookup finishes, the result is
    /// [`Selection::Superseded`] and must not be shown.
    pub async fn select(&self, feed_id: &str, item_guid: &str) -> Selection {
        let item = SelectedItem {
            feed_id: feed_id.to_string(),
            item_guid: item_guid.to_string(),
        };

        let generation = {
            let mut slot = self.selection.lock().await;
            slot.generation += 1;
            slot.item = Some(item.clone());
            slot.generation
        };

        let note = match self.notes.get(feed_id, item_guid).await {
            Ok(note) => note,
            Err(e) => {
                tracing::warn!("Failed to load note for {}:{}: {}", feed_id, item_guid, e);
                None
            }
        };

        if self.selection.lock().await.generation != generation {
            return Selection::Superseded;
        }

        Selection::Current { item, note }
    }

    pub async fn selected_item(&self) -> Option<SelectedItem> {
        self.selection.lock().await.item.clone()
    }

    pub async fn clear_selection(&self) {
        let mut slot = self.selection.lock().await;
        slot.generation += 1;
        slot.item = None;
    }

    /// Save a note for an article. Content is trimmed and must not be empty.
    pub async fn save_note(&self, feed_id: &str, item_guid: &str, content: &str) -> Result<AppState> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation("Note content cannot be empty".to_string()));
        }

        self.notes.upsert(feed_id, item_guid, content).await?;
        self.state().await
    }

    /// Delete the note of an article, if any
    pub async fn clear_note(&self, feed_id: &str, item_guid: &str) -> Result<AppState> {
        self.notes.remove(feed_id, item_guid).await?;
        self.state().await
    }

    /// Fresh state carrying the session's selection
    async fn state(&self) -> Result<AppState> {
        let mut state = self.snapshot().await?;
        state.selected_item = self.selected_item().await;
        Ok(state)
    }
}
