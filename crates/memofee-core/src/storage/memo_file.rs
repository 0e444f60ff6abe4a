use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::Mutex;

use super::kv::write_atomically;
use super::note_store::{next_revision_time, Memo};
use crate::{Error, Result};

/// The server's note document: one pretty-printed JSON array of [`Memo`]s.
///
/// Every read-modify-write cycle holds the same lock, so concurrent requests
/// within one process never interleave their updates.
pub struct MemoFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MemoFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self) -> Result<Vec<Memo>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    pub async fn get(&self, item_id: &str) -> Result<Option<Memo>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|m| m.item_id == item_id))
    }

    /// Create or overwrite the memo for `item_id`, keeping its creation time
    pub async fn save(&self, item_id: &str, content: &str) -> Result<Memo> {
        let _guard = self.lock.lock().await;
        let mut memos = self.load().await?;

        let memo = match memos.iter_mut().find(|m| m.item_id == item_id) {
            Some(existing) => {
                existing.content = content.to_string();
                existing.updated_at = next_revision_time(existing.updated_at);
                existing.clone()
            }
            None => {
                let now = Utc::now();
                let memo = Memo {
                    item_id: item_id.to_string(),
                    content: content.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                memos.push(memo.clone());
                memo
            }
        };

        self.store(&memos).await?;
        Ok(memo)
    }

    /// Delete the memo for `item_id`. Returns false if there was none.
    pub async fn delete(&self, item_id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut memos = self.load().await?;
        let before = memos.len();
        memos.retain(|m| m.item_id != item_id);

        if memos.len() == before {
            return Ok(false);
        }

        self.store(&memos).await?;
        Ok(true)
    }

    async fn load(&self) -> Result<Vec<Memo>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::Persistence(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&raw).map_err(|e| {
            Error::Persistence(format!("Corrupt memo file {}: {}", self.path.display(), e))
        })
    }

    async fn store(&self, memos: &[Memo]) -> Result<()> {
        let raw = serde_json::to_string_pretty(memos)?;
        write_atomically(&self.path, raw.as_bytes()).await?;
        tracing::debug!("Stored {} memos in {}", memos.len(), self.path.display());
        Ok(())
    }
}
