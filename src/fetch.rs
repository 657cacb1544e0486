//! The fetch worker: download a single URL, extract its links, and
//! persist the result.
//!
//! One [`reqwest::Client`] is built once and shared (cloned, which is
//! cheap — `reqwest::Client` is an `Arc` around a connection pool
//! internally) across every worker, rather than built per worker as the
//! original thread pool built a fresh `CURL*` handle per thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::FetchOutcome;
use crate::storage::Storage;
use crate::urlutil;

/// Build the shared HTTP client used by every fetch worker, honoring
/// `max_redirects`, `request_timeout_secs`, and `tls_verify` from config.
pub fn build_client(config: &Config) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(crate::config::USER_AGENT)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .danger_accept_invalid_certs(!config.tls_verify)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Optional global pacing gate: at most one request may be in flight per
/// `delay_ms` window across the whole worker pool (Open Question 3). A
/// `delay_ms` of zero disables pacing entirely — no lock is taken.
#[derive(Clone)]
pub struct Pacer {
    delay: Duration,
    last: Arc<AsyncMutex<Instant>>,
}

impl Pacer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            last: Arc::new(AsyncMutex::new(Instant::now() - Duration::from_secs(3600))),
        }
    }

    pub async fn wait_turn(&self) {
        if self.delay.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.delay {
            tokio::time::sleep(self.delay - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// Everything a single fetch-and-extract pass needs, bundled so it can be
/// cloned cheaply into each pool worker closure.
#[derive(Clone)]
pub struct FetchContext {
    pub client: Client,
    pub storage: Arc<Storage>,
    pub config: Arc<Config>,
    pub pacer: Pacer,
    pub session_id: i64,
}

/// One unit of work handed to a worker: a claimed frontier entry.
pub struct FetchJob {
    pub url: String,
    pub depth: u32,
}

/// Outcome of downloading a response body, capped at `max_page_size`
/// bytes. Streaming rather than reading-to-end-then-checking mirrors the
/// original's incremental buffer growth, except here we simply stop
/// reading instead of realloc-doubling a fixed buffer.
async fn download_capped(
    response: reqwest::Response,
    max_page_size: usize,
) -> Result<Vec<u8>, FetchOutcome> {
    use futures_util::StreamExt;

    let mut body = Vec::with_capacity(crate::config::INITIAL_PAGE_SIZE.min(max_page_size));
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk: Bytes = chunk.map_err(|_| FetchOutcome::Transport)?;
        if body.len() + chunk.len() > max_page_size {
            return Err(FetchOutcome::Oversize);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Fetch `job.url`, extract and enqueue its links, and persist the page.
/// Runs entirely to completion (success or failure) without panicking;
/// all failure paths are reported through `fetch_log` and the return
/// value, never a propagated `Err` that would kill the worker task.
pub async fn run_fetch(ctx: &FetchContext, job: FetchJob) {
    ctx.pacer.wait_turn().await;

    let response = match ctx.client.get(&job.url).send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(url = %job.url, error = %e, "fetch failed");
            let _ = ctx.storage.record_fetch(
                ctx.session_id,
                &job.url,
                FetchOutcome::Transport,
                None,
                Some(&e.to_string()),
            );
            let _ = ctx
                .storage
                .mark_error(ctx.session_id, &job.url, ctx.config.retry_failed_requests, ctx.config.max_retries);
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        debug!(url = %job.url, status = %status, "non-success response");
        let _ = ctx.storage.record_fetch(
            ctx.session_id,
            &job.url,
            FetchOutcome::HttpError,
            Some(status.as_u16()),
            None,
        );
        let _ = ctx
            .storage
            .mark_error(ctx.session_id, &job.url, ctx.config.retry_failed_requests, ctx.config.max_retries);
        return;
    }

    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("html"))
        .unwrap_or(true);

    let body = match download_capped(response, ctx.config.max_page_size).await {
        Ok(body) => body,
        Err(outcome) => {
            let _ = ctx
                .storage
                .record_fetch(ctx.session_id, &job.url, outcome, Some(status.as_u16()), None);
            let _ = ctx
                .storage
                .mark_error(ctx.session_id, &job.url, ctx.config.retry_failed_requests, ctx.config.max_retries);
            return;
        }
    };

    if body.is_empty() {
        let _ = ctx.storage.record_fetch(
            ctx.session_id,
            &job.url,
            FetchOutcome::HttpError,
            Some(status.as_u16()),
            Some("empty body"),
        );
        let _ = ctx
            .storage
            .mark_error(ctx.session_id, &job.url, ctx.config.retry_failed_requests, ctx.config.max_retries);
        return;
    }

    match ctx
        .storage
        .store_page(ctx.session_id, &job.url, &body, status.as_u16(), job.depth)
    {
        Ok(page_id) if ctx.config.save_pages => {
            save_page_file(&ctx.config.pages_dir, page_id, &body);
        }
        Ok(_) => {}
        Err(e) => warn!(url = %job.url, error = %e, "failed to store page"),
    }

    let mut outcome = FetchOutcome::Success;
    let mut outcome_detail = None;

    if is_html {
        match std::str::from_utf8(&body) {
            Ok(text) => extract_and_enqueue(ctx, &job, text),
            Err(_) => {
                outcome = FetchOutcome::ParseError;
                outcome_detail = Some("non-utf8 body");
            }
        }
    }

    let _ = ctx.storage.record_fetch(
        ctx.session_id,
        &job.url,
        outcome,
        Some(status.as_u16()),
        outcome_detail,
    );
}

/// Parse `html`, resolve every `<a href>`/`<link href>` against `job.url`,
/// and enqueue each surviving candidate one depth deeper than its source.
fn extract_and_enqueue(ctx: &FetchContext, job: &FetchJob, html: &str) {
    let document = Html::parse_document(html);
    let Ok(anchor_selector) = Selector::parse("a[href], link[href]") else {
        return;
    };

    let next_depth = job.depth + 1;
    if next_depth > ctx.config.max_depth {
        return;
    }

    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(resolved) = urlutil::resolve_url(&job.url, href) else {
            continue;
        };
        if !urlutil::is_http_scheme(&resolved) {
            continue;
        }
        let normalized = urlutil::normalize_url(&resolved);
        if normalized.len() > ctx.config.max_url_length {
            continue;
        }
        if urlutil::should_skip(&normalized, &ctx.config.skip_patterns) {
            continue;
        }
        if !urlutil::domain_allowed(&normalized, &ctx.config.allowed_domains) {
            continue;
        }

        match ctx.storage.is_page_stored(ctx.session_id, &normalized) {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => {
                warn!(url = %normalized, error = %e, "failed to check stored pages");
                continue;
            }
        }

        if let Err(e) = ctx.storage.enqueue(ctx.session_id, &normalized, next_depth) {
            warn!(url = %normalized, error = %e, "failed to enqueue link");
            continue;
        }
        if let Err(e) = ctx.storage.record_link(ctx.session_id, &job.url, &normalized) {
            warn!(source = %job.url, target = %normalized, error = %e, "failed to record link");
        }
    }
}

fn save_page_file(pages_dir: &str, page_id: i64, body: &[u8]) {
    let dir = std::path::Path::new(pages_dir);
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "failed to create pages directory");
        return;
    }

    let name = format!("{}{}.html", crate::config::PAGE_FILE_PREFIX, page_id);
    if let Err(e) = std::fs::write(dir.join(name), body) {
        warn!(page_id, error = %e, "failed to write page file");
    }
}
