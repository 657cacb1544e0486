//! Crawler-wide error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("invalid seed url: {0}")]
    InvalidSeedUrl(String),

    #[error("no resumable session found")]
    NoResumableSession,

    #[error("session {0} is not running")]
    SessionNotRunning(i64),
}

pub type Result<T> = std::result::Result<T, CrawlerError>;
