use std::sync::atomic::Ordering;

use chrono::Utc;

use crate::error::Result;
use crate::models::{FrontierEntry, UrlStatus};

use super::{format_time, parse_time, Storage};

impl Storage {
    /// Insert a frontier row for `url` at `depth`, no-op on collision
    /// (`UNIQUE(session_id, url)`). Returns whether a row was actually
    /// inserted, and bumps the in-memory "links found" counter only then,
    /// matching the spec's explicit correction of the original's count-on-
    /// every-call bug (SQLite's `INSERT OR IGNORE` always reports
    /// `SQLITE_DONE`, insert or not, so the original C crawler counts
    /// duplicates as new links).
    pub fn enqueue(&self, session_id: i64, url: &str, depth: u32) -> Result<bool> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO url_queue (session_id, url, depth, status, added_time)
             VALUES (?1, ?2, ?3, 'pending', ?4)",
            rusqlite::params![session_id, url, depth, format_time(Utc::now())],
        )?;
        let inserted = conn.changes() == 1;
        if inserted {
            self.links_found.fetch_add(1, Ordering::Relaxed);
        }
        Ok(inserted)
    }

    /// Atomically claim the oldest pending row and mark it `crawled`
    /// *before* returning it. This is what makes dispatch at-most-once
    /// under concurrency: a worker's claim is terminal the instant it
    /// happens, not when the fetch that follows it finishes.
    pub fn claim_next(&self, session_id: i64) -> Result<Option<FrontierEntry>> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;

        let found: Option<(i64, String, u32, u32)> = {
            let mut stmt = tx.prepare(
                "SELECT id, url, depth, error_count FROM url_queue
                 WHERE session_id = ?1 AND status = 'pending'
                 ORDER BY depth ASC, added_time ASC, id ASC LIMIT 1",
            )?;
            let mut rows = stmt.query([session_id])?;
            match rows.next()? {
                Some(row) => Some((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                None => None,
            }
        };

        let Some((id, url, depth, error_count)) = found else {
            tx.commit()?;
            return Ok(None);
        };

        let now = Utc::now();
        tx.execute(
            "UPDATE url_queue SET status = 'crawled', crawled_time = ?1 WHERE id = ?2",
            rusqlite::params![format_time(now), id],
        )?;
        tx.commit()?;

        Ok(Some(FrontierEntry {
            session_id,
            url,
            depth,
            status: UrlStatus::Crawled,
            added_time: now,
            crawled_time: Some(now),
            error_count,
        }))
    }

    /// Record a failed fetch against an already-claimed row. When retries
    /// are enabled and the row hasn't exhausted `max_retries`, the row is
    /// reopened to `pending` so a later `claim_next` picks it up again;
    /// otherwise it stays `crawled` (terminal), matching the default
    /// no-retry behavior described for this status.
    pub fn mark_error(
        &self,
        session_id: i64,
        url: &str,
        retry_enabled: bool,
        max_retries: u32,
    ) -> Result<()> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let error_count: u32 = conn.query_row(
            "SELECT error_count FROM url_queue WHERE session_id = ?1 AND url = ?2",
            rusqlite::params![session_id, url],
            |row| row.get(0),
        )?;
        let next_count = error_count + 1;
        if retry_enabled && next_count <= max_retries {
            conn.execute(
                "UPDATE url_queue SET status = 'pending', error_count = ?1, crawled_time = NULL
                 WHERE session_id = ?2 AND url = ?3",
                rusqlite::params![next_count, session_id, url],
            )?;
        } else {
            conn.execute(
                "UPDATE url_queue SET error_count = ?1 WHERE session_id = ?2 AND url = ?3",
                rusqlite::params![next_count, session_id, url],
            )?;
        }
        Ok(())
    }

    /// True if the frontier has no rows still pending for `session_id`.
    pub fn queue_empty(&self, session_id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM url_queue WHERE session_id = ?1 AND status = 'pending'",
            [session_id],
            |row| row.get(0),
        )?;
        Ok(count == 0)
    }

    /// Check "queue empty" and an arbitrary caller predicate (typically
    /// "no worker is currently busy") as one atomic step, by evaluating
    /// `still_idle` while the storage mutex is still held.
    ///
    /// The dispatcher's termination check is a compound condition: the
    /// frontier is empty *and* no in-flight fetch is about to enqueue more
    /// rows. Checking those two facts as separate locked sections leaves a
    /// window between them where a worker can enqueue new pending rows
    /// after the frontier looked empty, and the dispatcher would exit with
    /// work still outstanding. Folding the second check into the same
    /// critical section as the `COUNT(*)` closes that window.
    pub fn queue_empty_and<F>(&self, session_id: i64, still_idle: F) -> Result<bool>
    where
        F: FnOnce() -> bool,
    {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM url_queue WHERE session_id = ?1 AND status = 'pending'",
            [session_id],
            |row| row.get(0),
        )?;
        Ok(count == 0 && still_idle())
    }

    pub fn frontier_row(&self, session_id: i64, url: &str) -> Result<Option<FrontierEntry>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT url, depth, status, added_time, crawled_time, error_count
             FROM url_queue WHERE session_id = ?1 AND url = ?2",
        )?;
        let mut rows = stmt.query(rusqlite::params![session_id, url])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let status_str: String = row.get(2)?;
        Ok(Some(FrontierEntry {
            session_id,
            url: row.get(0)?,
            depth: row.get(1)?,
            status: UrlStatus::from_str(&status_str).unwrap_or(UrlStatus::Pending),
            added_time: parse_time(&row.get::<_, String>(3)?),
            crawled_time: row.get::<_, Option<String>>(4)?.map(|s| parse_time(&s)),
            error_count: row.get(5)?,
        }))
    }
}
