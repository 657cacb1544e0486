use chrono::Utc;

use crate::error::{CrawlerError, Result};
use crate::models::{Session, SessionStatus, SessionSummary};

use super::{format_time, parse_time, Storage};

impl Storage {
    /// Create a new session row for `start_url` in the `running` state.
    pub fn create_session(&self, start_url: &str) -> Result<Session> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let now = Utc::now();
        conn.execute(
            "INSERT INTO crawl_sessions (start_url, start_time, status) VALUES (?1, ?2, ?3)",
            rusqlite::params![start_url, format_time(now), SessionStatus::Running.as_str()],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Session {
            id,
            start_url: start_url.to_string(),
            start_time: now,
            end_time: None,
            status: SessionStatus::Running,
        })
    }

    /// Load a session by id, regardless of status.
    pub fn find_session(&self, session_id: i64) -> Result<Option<Session>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, start_url, start_time, end_time, status FROM crawl_sessions WHERE id = ?1",
        )?;
        let mut rows = stmt.query([session_id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some(row_to_session(row)?))
    }

    /// Most recent `running` session, if any (the default target of
    /// `webcrawler resume` when no `--session` is given).
    pub fn find_resumable(&self) -> Result<Option<Session>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, start_url, start_time, end_time, status FROM crawl_sessions
             WHERE status = 'running' ORDER BY id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query([])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some(row_to_session(row)?))
    }

    /// All `running` sessions with their current progress, newest first.
    pub fn resumable_sessions(&self) -> Result<Vec<SessionSummary>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT s.id, s.start_url, s.start_time,
                    (SELECT COUNT(*) FROM pages p WHERE p.session_id = s.id),
                    (SELECT COUNT(*) FROM url_queue q WHERE q.session_id = s.id AND q.status = 'pending')
             FROM crawl_sessions s
             WHERE s.status = 'running'
             ORDER BY s.id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SessionSummary {
                id: row.get(0)?,
                start_url: row.get(1)?,
                start_time: parse_time(&row.get::<_, String>(2)?),
                pages_crawled: row.get(3)?,
                urls_in_queue: row.get(4)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(CrawlerError::from)
    }

    /// Mark a session `completed`, stamping `end_time`.
    pub fn complete_session(&self, session_id: i64) -> Result<()> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let updated = conn.execute(
            "UPDATE crawl_sessions SET status = ?1, end_time = ?2 WHERE id = ?3 AND status = 'running'",
            rusqlite::params![SessionStatus::Completed.as_str(), format_time(Utc::now()), session_id],
        )?;
        if updated == 0 {
            return Err(CrawlerError::SessionNotRunning(session_id));
        }
        Ok(())
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<Session> {
    let status_str: String = row.get(4)?;
    Ok(Session {
        id: row.get(0)?,
        start_url: row.get(1)?,
        start_time: parse_time(&row.get::<_, String>(2)?),
        end_time: row.get::<_, Option<String>>(3)?.map(|s| parse_time(&s)),
        status: SessionStatus::from_str(&status_str).unwrap_or(SessionStatus::Running),
    })
}
