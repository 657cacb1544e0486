//! Frontier and session invariants, exercised against a real temp-file
//! SQLite database the way `migration_parity.rs` exercises schema shape
//! directly through `rusqlite::Connection`.

use webcrawler::models::{FetchOutcome, UrlStatus};
use webcrawler::storage::Storage;

fn open_temp() -> (Storage, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawler.db");
    let storage = Storage::open(&db_path).unwrap();
    (storage, dir)
}

#[test]
fn enqueue_is_idempotent_and_counts_only_first_insert() {
    let (storage, _dir) = open_temp();
    let session = storage.create_session("http://example.com/").unwrap();

    assert!(storage.enqueue(session.id, "http://example.com/a", 1).unwrap());
    assert!(!storage.enqueue(session.id, "http://example.com/a", 1).unwrap());

    let row = storage
        .frontier_row(session.id, "http://example.com/a")
        .unwrap()
        .expect("row exists");
    assert_eq!(row.depth, 1);
    assert_eq!(row.status, UrlStatus::Pending);
}

#[test]
fn claim_next_marks_crawled_and_is_at_most_once() {
    let (storage, _dir) = open_temp();
    let session = storage.create_session("http://example.com/").unwrap();
    storage.enqueue(session.id, "http://example.com/a", 1).unwrap();

    let claimed = storage.claim_next(session.id).unwrap().expect("one pending row");
    assert_eq!(claimed.url, "http://example.com/a");
    assert_eq!(claimed.status, UrlStatus::Crawled);

    // Nothing left to claim: the row is terminal even though no fetch
    // result has been recorded for it yet.
    assert!(storage.claim_next(session.id).unwrap().is_none());
    assert!(storage.queue_empty(session.id).unwrap());
}

#[test]
fn claim_next_orders_by_depth_then_insertion() {
    let (storage, _dir) = open_temp();
    let session = storage.create_session("http://example.com/").unwrap();
    storage.enqueue(session.id, "http://example.com/first", 0).unwrap();
    storage.enqueue(session.id, "http://example.com/second", 0).unwrap();

    let first = storage.claim_next(session.id).unwrap().unwrap();
    let second = storage.claim_next(session.id).unwrap().unwrap();
    assert_eq!(first.url, "http://example.com/first");
    assert_eq!(second.url, "http://example.com/second");
}

#[test]
fn claim_next_prefers_lower_depth_over_insertion_order() {
    let (storage, _dir) = open_temp();
    let session = storage.create_session("http://example.com/").unwrap();

    // Inserted before the depth-0 row, but at a deeper level: it must not
    // be claimed first despite its earlier insertion time.
    storage.enqueue(session.id, "http://example.com/deep", 2).unwrap();
    storage.enqueue(session.id, "http://example.com/shallow", 0).unwrap();
    storage.enqueue(session.id, "http://example.com/mid", 1).unwrap();

    let first = storage.claim_next(session.id).unwrap().unwrap();
    let second = storage.claim_next(session.id).unwrap().unwrap();
    let third = storage.claim_next(session.id).unwrap().unwrap();
    assert_eq!(first.url, "http://example.com/shallow");
    assert_eq!(second.url, "http://example.com/mid");
    assert_eq!(third.url, "http://example.com/deep");
}

#[test]
fn mark_error_without_retry_leaves_row_terminal() {
    let (storage, _dir) = open_temp();
    let session = storage.create_session("http://example.com/").unwrap();
    storage.enqueue(session.id, "http://example.com/a", 0).unwrap();
    storage.claim_next(session.id).unwrap();

    storage.mark_error(session.id, "http://example.com/a", false, 3).unwrap();

    let row = storage
        .frontier_row(session.id, "http://example.com/a")
        .unwrap()
        .unwrap();
    assert_eq!(row.status, UrlStatus::Crawled);
    assert_eq!(row.error_count, 1);
    assert!(storage.claim_next(session.id).unwrap().is_none());
}

#[test]
fn mark_error_with_retry_reopens_row_for_reclaim() {
    let (storage, _dir) = open_temp();
    let session = storage.create_session("http://example.com/").unwrap();
    storage.enqueue(session.id, "http://example.com/a", 0).unwrap();
    storage.claim_next(session.id).unwrap();

    storage.mark_error(session.id, "http://example.com/a", true, 3).unwrap();

    let reclaimed = storage
        .claim_next(session.id)
        .unwrap()
        .expect("row reopened for retry");
    assert_eq!(reclaimed.url, "http://example.com/a");
    assert_eq!(reclaimed.error_count, 1);
}

#[test]
fn mark_error_with_retry_exhausted_stays_terminal() {
    let (storage, _dir) = open_temp();
    let session = storage.create_session("http://example.com/").unwrap();
    storage.enqueue(session.id, "http://example.com/a", 0).unwrap();

    for _ in 0..2 {
        storage.claim_next(session.id).unwrap();
        storage.mark_error(session.id, "http://example.com/a", true, 1).unwrap();
    }

    // max_retries == 1: first failure reopens, second exhausts.
    assert!(storage.claim_next(session.id).unwrap().is_none());
    let row = storage
        .frontier_row(session.id, "http://example.com/a")
        .unwrap()
        .unwrap();
    assert_eq!(row.error_count, 2);
}

#[test]
fn store_page_is_unique_per_session_and_url() {
    let (storage, _dir) = open_temp();
    let session = storage.create_session("http://example.com/").unwrap();

    let id1 = storage
        .store_page(session.id, "http://example.com/", b"<html></html>", 200, 0)
        .unwrap();
    let id2 = storage
        .store_page(session.id, "http://example.com/", b"<html>different</html>", 200, 0)
        .unwrap();

    assert_eq!(id1, id2);
    assert!(storage.is_page_stored(session.id, "http://example.com/").unwrap());
}

#[test]
fn session_stats_reconciles_from_storage() {
    let (storage, _dir) = open_temp();
    let session = storage.create_session("http://example.com/").unwrap();

    storage.enqueue(session.id, "http://example.com/a", 1).unwrap();
    storage.enqueue(session.id, "http://example.com/b", 1).unwrap();
    storage
        .store_page(session.id, "http://example.com/a", b"body", 200, 1)
        .unwrap();
    storage
        .record_fetch(session.id, "http://example.com/b", FetchOutcome::Transport, None, Some("timeout"))
        .unwrap();

    let stats = storage.session_stats(session.id).unwrap();
    assert_eq!(stats.pages_crawled, 1);
    assert_eq!(stats.errors, 1);
    assert!(stats.links_found >= 2);
}

#[test]
fn resumable_sessions_lists_only_running_sessions() {
    let (storage, _dir) = open_temp();
    let a = storage.create_session("http://a.example/").unwrap();
    let b = storage.create_session("http://b.example/").unwrap();
    storage.complete_session(b.id).unwrap();

    let resumable = storage.resumable_sessions().unwrap();
    assert_eq!(resumable.len(), 1);
    assert_eq!(resumable[0].id, a.id);
}

#[test]
fn resume_preserves_frontier_state_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawler.db");

    let session_id = {
        let storage = Storage::open(&db_path).unwrap();
        let session = storage.create_session("http://example.com/").unwrap();
        storage.enqueue(session.id, "http://example.com/a", 0).unwrap();
        storage.enqueue(session.id, "http://example.com/b", 0).unwrap();
        storage.claim_next(session.id).unwrap();
        session.id
    };

    let storage = Storage::open(&db_path).unwrap();
    let resumed = storage.find_resumable().unwrap().expect("session still running");
    assert_eq!(resumed.id, session_id);

    let a = storage.frontier_row(session_id, "http://example.com/a").unwrap().unwrap();
    let b = storage.frontier_row(session_id, "http://example.com/b").unwrap().unwrap();
    assert_eq!(a.status, UrlStatus::Crawled);
    assert_eq!(b.status, UrlStatus::Pending);
}
