//! Derived session statistics.

/// Snapshot of crawl progress for a session, reconciled from storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    pub pages_crawled: u64,
    pub links_found: u64,
    pub errors: u64,
    pub skipped_urls: u64,
}
