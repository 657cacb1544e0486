use chrono::Utc;

use crate::error::Result;

use super::{format_time, Storage};

impl Storage {
    /// Record a discovered `source -> target` edge. Called unconditionally
    /// whenever the extraction worker attempts an enqueue, independent of
    /// whether that enqueue actually inserted a new frontier row, so the
    /// link graph can show every edge a page contributed even when its
    /// target was already known.
    pub fn record_link(&self, session_id: i64, source_url: &str, target_url: &str) -> Result<()> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.execute(
            "INSERT INTO extracted_links (session_id, source_url, target_url, discovered_time)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![session_id, source_url, target_url, format_time(Utc::now())],
        )?;
        Ok(())
    }
}
