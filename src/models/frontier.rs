//! Frontier (crawl queue) models.

use chrono::{DateTime, Utc};

/// Status of a single frontier row. Monotonic: once a row reaches a
/// terminal state (`Crawled`, `Error`, `Skipped`) it never transitions
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStatus {
    Pending,
    Crawled,
    Error,
    Skipped,
}

impl UrlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Crawled => "crawled",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "crawled" => Some(Self::Crawled),
            "error" => Some(Self::Error),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// A single frontier (`url_queue`) row.
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub session_id: i64,
    pub url: String,
    pub depth: u32,
    pub status: UrlStatus,
    pub added_time: DateTime<Utc>,
    pub crawled_time: Option<DateTime<Utc>>,
    pub error_count: u32,
}

/// Outcome of a single fetch attempt, as recorded in `fetch_log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    HttpError,
    Transport,
    Oversize,
    ParseError,
}

impl FetchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::HttpError => "http_error",
            Self::Transport => "transport",
            Self::Oversize => "oversize",
            Self::ParseError => "parse_error",
        }
    }
}
