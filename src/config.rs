//! Configuration management for the crawler.
//!
//! Compile-time defaults (mirroring the original C `config.h`) can be
//! overridden by an optional `crawler.toml` file and, on top of that, by
//! CLI flags. Precedence: CLI > file > built-in default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_URLS: u64 = 10_000;
pub const MAX_DEPTH: u32 = 3;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const MAX_REDIRECTS: usize = 5;
pub const MAX_PAGE_SIZE: usize = 10 * 1024 * 1024;
pub const INITIAL_PAGE_SIZE: usize = 4096;
pub const PAGE_FILE_PREFIX: &str = "page_";
pub const USER_AGENT: &str = "WebCrawler/1.0";
pub const DEFAULT_THREADS: usize = 4;
pub const MAX_RETRIES: u32 = 3;

fn default_skip_patterns() -> Vec<String> {
    [
        ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".mp3", ".mp4", ".avi", ".mov", ".zip",
        ".rar", ".tar", ".gz", ".exe", ".dmg", ".pkg", "mailto:", "javascript:", "tel:",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Crawler configuration surface. Every field has a spec-mandated default;
/// a `crawler.toml` file and CLI flags may override any of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file.
    pub db_path: String,
    /// Directory saved pages are written to, when `save_pages` is set.
    pub pages_dir: String,
    /// Number of concurrent fetch workers.
    pub threads: usize,
    /// Maximum length, in bytes, of an absolute URL eligible for enqueue.
    pub max_url_length: usize,
    /// Global cap on pages successfully crawled before the dispatcher stops.
    pub max_urls: u64,
    /// Maximum crawl depth from the seed URL (seed is depth 0).
    pub max_depth: u32,
    /// Overall HTTP request timeout, in seconds.
    pub request_timeout_secs: u64,
    /// Maximum redirects the HTTP client will follow.
    pub max_redirects: usize,
    /// Maximum response body size accepted before aborting a fetch.
    pub max_page_size: usize,
    /// Initial capacity reserved for a page's body buffer.
    pub initial_page_size: usize,
    /// Whether to persist downloaded page bodies under `pages_dir`.
    pub save_pages: bool,
    /// Verbose logging (maps to the `tracing` filter used at startup).
    pub verbose: bool,
    /// Minimum delay, in milliseconds, enforced globally between requests
    /// issued by any worker. `0` disables pacing (Open Question 3).
    pub delay_ms: u64,
    /// Whether a failed fetch should be retried (Open Question 1).
    pub retry_failed_requests: bool,
    /// Maximum retry attempts per URL when `retry_failed_requests` is set.
    pub max_retries: u32,
    /// Case-sensitive substrings that cause a URL to be skipped at enqueue.
    #[serde(default = "default_skip_patterns")]
    pub skip_patterns: Vec<String>,
    /// If non-empty, only links whose host matches (or is a subdomain of)
    /// one of these entries are enqueued (Open Question 4).
    pub allowed_domains: Vec<String>,
    /// TLS peer/host verification. Disabling this is only ever appropriate
    /// against a known, trusted target during development.
    pub tls_verify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "crawler.db".to_string(),
            pages_dir: "pages".to_string(),
            threads: DEFAULT_THREADS,
            max_url_length: MAX_URL_LENGTH,
            max_urls: MAX_URLS,
            max_depth: MAX_DEPTH,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            max_redirects: MAX_REDIRECTS,
            max_page_size: MAX_PAGE_SIZE,
            initial_page_size: INITIAL_PAGE_SIZE,
            save_pages: true,
            verbose: false,
            delay_ms: 0,
            retry_failed_requests: false,
            max_retries: MAX_RETRIES,
            skip_patterns: default_skip_patterns(),
            allowed_domains: Vec::new(),
            tls_verify: true,
        }
    }
}

impl Config {
    /// Create `pages_dir` (mode `0755` on unix) up front if page-saving is
    /// enabled, rather than waiting for the first successful fetch to
    /// discover it's missing.
    pub fn ensure_pages_dir(&self) -> std::io::Result<()> {
        if !self.save_pages {
            return Ok(());
        }
        fs::create_dir_all(&self.pages_dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o755);
            fs::set_permissions(&self.pages_dir, perms)?;
        }
        Ok(())
    }

    /// Load configuration from an optional TOML file, falling back to
    /// defaults for anything the file doesn't specify (and for a missing
    /// file entirely).
    pub fn load(path: Option<&Path>) -> crate::error::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .map_err(|e| crate::error::CrawlerError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&text)
            .map_err(|e| crate::error::CrawlerError::Config(format!("{}: {}", path.display(), e)))
    }
}
