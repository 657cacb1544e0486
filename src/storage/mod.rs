//! Durable, SQLite-backed storage for crawl sessions, the URL frontier,
//! fetched pages, the link graph, and the fetch log.
//!
//! A single [`rusqlite::Connection`] behind one [`std::sync::Mutex`] backs
//! every operation. The dispatcher and every fetch worker share one
//! [`Storage`] handle; there is no connection pool. This mirrors the
//! original crawler's single persistent `sqlite3*` handle with reused
//! prepared statements far more closely than a per-call-connect pool would,
//! and gives us the "single writer, many readers" discipline the frontier's
//! claim semantics depend on for free.

mod fetch_log;
mod frontier;
mod links;
mod pages;
mod session;
mod stats;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;

use crate::error::Result;

const SCHEMA: &str = include_str!("schema.sql");

/// Durable storage handle. Cheap to clone (wraps an `Arc` internally via
/// `std::sync::Mutex` + a plain reference count is not needed because a
/// single [`Storage`] is constructed once and shared behind an `Arc` by
/// its owner).
pub struct Storage {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    links_found: AtomicU64,
}

impl Storage {
    /// Open (creating if necessary) the database at `path`, apply pragmas,
    /// and run the schema migration. Idempotent: safe to call against an
    /// existing database from a prior run.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;

        let storage = Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
            links_found: AtomicU64::new(0),
        };
        Ok(storage)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Seed the in-memory "links found" fast counter from the frontier's
    /// current row count for `session_id`, so a resumed session reports
    /// correct progress without waiting for the first new enqueue.
    pub fn prime_links_counter(&self, session_id: i64) -> Result<()> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM url_queue WHERE session_id = ?1",
            [session_id],
            |row| row.get(0),
        )?;
        self.links_found.store(count, Ordering::Relaxed);
        Ok(())
    }
}

pub(crate) fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339()
}

pub(crate) fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc.timestamp_opt(0, 0).unwrap())
}
