use chrono::Utc;

use crate::error::Result;

use super::{format_time, Storage};

impl Storage {
    /// True if a page for `url` has already been stored for this session,
    /// the "already a stored page" half of the extraction worker's
    /// re-enqueue check.
    pub fn is_page_stored(&self, session_id: i64, url: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE session_id = ?1 AND url = ?2",
            rusqlite::params![session_id, url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Persist a fetched page body. No-ops on a `(session_id, url)`
    /// collision, so a page can only ever be stored once per session.
    /// Returns the page's row id, either freshly inserted or the
    /// pre-existing one on collision — the fetch worker uses it to name
    /// the page file it writes to `pages_dir`.
    pub fn store_page(
        &self,
        session_id: i64,
        url: &str,
        content: &[u8],
        response_code: u16,
        depth: u32,
    ) -> Result<i64> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO pages
                (session_id, url, content, content_length, response_code, depth, crawl_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                session_id,
                url,
                content,
                content.len() as i64,
                response_code,
                depth,
                format_time(Utc::now()),
            ],
        )?;
        conn.query_row(
            "SELECT id FROM pages WHERE session_id = ?1 AND url = ?2",
            rusqlite::params![session_id, url],
            |row| row.get(0),
        )
        .map_err(Into::into)
    }
}
