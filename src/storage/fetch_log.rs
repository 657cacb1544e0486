use chrono::Utc;

use crate::error::Result;
use crate::models::FetchOutcome;

use super::{format_time, Storage};

impl Storage {
    /// Append an audit row for a single fetch attempt. This is where
    /// error and oversize outcomes actually become visible; the frontier's
    /// own `error` status is a dead end by default (see [`Storage::mark_error`]),
    /// so `fetch_log` is the source of truth for `SessionStats::errors`.
    pub fn record_fetch(
        &self,
        session_id: i64,
        url: &str,
        outcome: FetchOutcome,
        http_status: Option<u16>,
        error_message: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.execute(
            "INSERT INTO fetch_log (session_id, url, outcome, http_status, error_message, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                session_id,
                url,
                outcome.as_str(),
                http_status,
                error_message,
                format_time(Utc::now()),
            ],
        )?;
        Ok(())
    }
}
