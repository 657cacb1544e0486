//! Crawl session models.

use chrono::{DateTime, Utc};

/// Status of a crawl session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// A single crawl session: identity, seed, and lifecycle timestamps.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub start_url: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
}

/// Progress summary for a resumable session, as listed by `webcrawler sessions`.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: i64,
    pub start_url: String,
    pub start_time: DateTime<Utc>,
    pub pages_crawled: u64,
    pub urls_in_queue: u64,
}
