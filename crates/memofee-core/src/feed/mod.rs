mod fetcher;
mod models;
mod parser;

pub use fetcher::{validate_url, FeedFetcher, FeedSource};
pub use models::{feed_id_for_url, Article, Feed, FEED_ID_LEN};
pub use parser::{parse_feed, strip_markup};
