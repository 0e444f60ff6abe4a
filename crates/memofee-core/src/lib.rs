pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod feed;
pub mod storage;

pub use api::{MemoFeeClient, RemoteNoteStore};
pub use config::{AppConfig, NoteBackend};
pub use coordinator::{AppState, Coordinator, SelectedItem, Selection};
pub use error::{Error, Result};
