use std::sync::atomic::Ordering;

use crate::error::Result;
use crate::models::SessionStats;

use super::Storage;

impl Storage {
    /// Reconcile and return progress counters for `session_id`. Pages and
    /// errors are always read straight from the tables that own them;
    /// `links_found` prefers the fast in-memory counter (kept current by
    /// every successful [`Storage::enqueue`]) but that counter is itself
    /// seeded from storage on open/resume, so the two never drift.
    pub fn session_stats(&self, session_id: i64) -> Result<SessionStats> {
        let conn = self.conn.lock().expect("storage mutex poisoned");

        let pages_crawled: u64 = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE session_id = ?1",
            [session_id],
            |row| row.get(0),
        )?;
        let errors: u64 = conn.query_row(
            "SELECT COUNT(*) FROM fetch_log WHERE session_id = ?1 AND outcome != 'success'",
            [session_id],
            |row| row.get(0),
        )?;
        let skipped_urls: u64 = conn.query_row(
            "SELECT COUNT(*) FROM url_queue WHERE session_id = ?1 AND status = 'skipped'",
            [session_id],
            |row| row.get(0),
        )?;

        Ok(SessionStats {
            pages_crawled,
            links_found: self.links_found.load(Ordering::Relaxed),
            errors,
            skipped_urls,
        })
    }
}
