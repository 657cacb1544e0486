//! The dispatcher: the crawl's main loop. Seeds the frontier, claims
//! pending rows and hands them to the worker pool, periodically reports
//! progress, and decides when the crawl is actually done.

use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::Config;
use crate::fetch::{self, FetchContext, FetchJob, Pacer};
use crate::pool::Pool;
use crate::storage::Storage;

const REPORT_INTERVAL: Duration = Duration::from_secs(60);
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Run a crawl session to completion: seed, dispatch, and wait for the
/// frontier to drain. Returns once every reachable URL (within the
/// configured bounds) has been claimed and processed, or the `max_urls`
/// cap has been reached.
pub async fn run(storage: Arc<Storage>, config: Arc<Config>, session_id: i64, start_url: &str) -> crate::error::Result<()> {
    storage.enqueue(session_id, start_url, 0)?;
    storage.prime_links_counter(session_id)?;

    let client = fetch::build_client(&config).map_err(crate::error::CrawlerError::Http)?;
    let pacer = Pacer::new(config.delay_ms);

    let ctx = FetchContext {
        client,
        storage: storage.clone(),
        config: config.clone(),
        pacer,
        session_id,
    };

    let pool: Pool<FetchJob> = Pool::new(config.threads, config.threads * 4, {
        let ctx = ctx.clone();
        move |job: FetchJob| {
            let ctx = ctx.clone();
            async move { fetch::run_fetch(&ctx, job).await }
        }
    });

    let progress = build_progress_bar(&config);
    let mut last_report = Instant::now();

    loop {
        let stats = storage.session_stats(session_id)?;
        progress.set_position(stats.pages_crawled);
        if stats.pages_crawled >= config.max_urls {
            info!(pages_crawled = stats.pages_crawled, "max_urls reached, stopping dispatch");
            break;
        }

        match storage.claim_next(session_id)? {
            Some(entry) => {
                // Already claimed (terminal) by claim_next. A page already
                // stored for this URL — the seed can race with extraction
                // writing the same page — needs no fetch at all.
                if storage.is_page_stored(session_id, &entry.url)? {
                    continue;
                }
                if pool
                    .submit(FetchJob {
                        url: entry.url,
                        depth: entry.depth,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            None => {
                let done = storage.queue_empty_and(session_id, || !pool.is_busy())?;
                if done {
                    break;
                }
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
            }
        }

        if last_report.elapsed() >= REPORT_INTERVAL {
            log_stats(&storage, session_id)?;
            last_report = Instant::now();
        }
    }

    pool.wait_idle().await;
    pool.shutdown().await;

    let stats = storage.session_stats(session_id)?;
    progress.set_position(stats.pages_crawled);
    progress.finish_with_message("crawl complete");

    storage.complete_session(session_id)?;
    log_stats(&storage, session_id)?;

    Ok(())
}

fn build_progress_bar(config: &Config) -> ProgressBar {
    let pb = ProgressBar::new(config.max_urls);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

fn log_stats(storage: &Storage, session_id: i64) -> crate::error::Result<()> {
    let stats = storage.session_stats(session_id)?;
    info!(
        session_id,
        pages_crawled = stats.pages_crawled,
        links_found = stats.links_found,
        errors = stats.errors,
        skipped_urls = stats.skipped_urls,
        "crawl progress"
    );
    Ok(())
}
