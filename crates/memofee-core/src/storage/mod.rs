mod feed_store;
mod kv;
mod memo_file;
mod note_store;

pub use feed_store::{FeedStore, FEEDS_KEY};
pub use kv::{JsonFileKv, KeyValueStore, MemoryKv};
pub use memo_file::MemoFile;
pub use note_store::{item_id, split_item_id, LocalNoteStore, Memo, Note, NoteStore, NOTES_KEY};
