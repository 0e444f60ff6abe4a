use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input; never retried automatically
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or status failure while contacting a feed source or the server
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    /// The store could not be read or written; the operation was not durably applied
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A feed fetch is already in progress")]
    FetchInProgress,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Input errors: explicit validation failures and unparsable URLs
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::UrlParse(_))
    }

    /// Errors caused by the feed source rather than by this system
    pub fn is_feed_failure(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::FeedParse(_) | Error::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
