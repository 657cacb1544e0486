//! Command-line interface.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;

use crate::config::Config;
use crate::storage::Storage;

#[derive(Parser)]
#[command(name = "webcrawler")]
#[command(about = "Persistent, multi-threaded web crawler with a durable SQLite-backed frontier")]
#[command(version)]
pub struct Cli {
    /// Path to a crawler.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled, ahead of `Cli::parse` so the tracing
/// filter can be set up before subcommand dispatch.
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new crawl from a seed URL
    Crawl {
        /// Seed URL to start crawling from
        url: String,

        /// Number of concurrent fetch workers
        #[arg(short, long)]
        threads: Option<usize>,

        /// Maximum pages to crawl before stopping
        #[arg(long)]
        max_urls: Option<u64>,

        /// Maximum crawl depth from the seed URL
        #[arg(long)]
        max_depth: Option<u32>,

        /// Path to the SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,

        /// Persist downloaded page bodies to disk
        #[arg(long)]
        save_pages: bool,

        /// Minimum delay, in milliseconds, between requests
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Restrict crawling to this host (may be passed multiple times)
        #[arg(long = "allowed-domain")]
        allowed_domains: Vec<String>,
    },

    /// Resume an interrupted crawl session
    Resume {
        /// Session id to resume (defaults to the most recent running session)
        #[arg(long)]
        session: Option<i64>,

        /// Path to the SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// List resumable sessions
    Sessions {
        /// Path to the SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let base_config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Crawl {
            url,
            threads,
            max_urls,
            max_depth,
            db,
            save_pages,
            delay_ms,
            allowed_domains,
        } => {
            let mut config = base_config;
            if let Some(threads) = threads {
                config.threads = threads;
            }
            if let Some(max_urls) = max_urls {
                config.max_urls = max_urls;
            }
            if let Some(max_depth) = max_depth {
                config.max_depth = max_depth;
            }
            if let Some(db) = db {
                config.db_path = db.display().to_string();
            }
            if save_pages {
                config.save_pages = true;
            }
            if let Some(delay_ms) = delay_ms {
                config.delay_ms = delay_ms;
            }
            if !allowed_domains.is_empty() {
                config.allowed_domains = allowed_domains;
            }

            if !crate::urlutil::is_http_scheme(&url) {
                return Err(crate::error::CrawlerError::InvalidSeedUrl(url).into());
            }

            config.ensure_pages_dir().map_err(|e| {
                crate::error::CrawlerError::Config(format!("pages_dir: {e}"))
            })?;

            let storage = Arc::new(Storage::open(std::path::Path::new(&config.db_path))?);
            let session = storage.create_session(&url)?;
            println!("{} session {} for {}", style("starting").green(), session.id, url);

            crate::dispatch::run(storage, Arc::new(config), session.id, &url).await?;
        }

        Commands::Resume { session, db } => {
            let mut config = base_config;
            if let Some(db) = db {
                config.db_path = db.display().to_string();
            }

            config.ensure_pages_dir().map_err(|e| {
                crate::error::CrawlerError::Config(format!("pages_dir: {e}"))
            })?;

            let storage = Arc::new(Storage::open(std::path::Path::new(&config.db_path))?);
            let target = match session {
                Some(id) => {
                    let found = storage
                        .find_session(id)?
                        .ok_or(crate::error::CrawlerError::NoResumableSession)?;
                    if found.status != crate::models::SessionStatus::Running {
                        return Err(crate::error::CrawlerError::SessionNotRunning(id).into());
                    }
                    found
                }
                None => storage
                    .find_resumable()?
                    .ok_or(crate::error::CrawlerError::NoResumableSession)?,
            };
            println!(
                "{} session {} ({})",
                style("resuming").yellow(),
                target.id,
                target.start_url
            );

            crate::dispatch::run(storage, Arc::new(config), target.id, &target.start_url).await?;
        }

        Commands::Sessions { db } => {
            let mut config = base_config;
            if let Some(db) = db {
                config.db_path = db.display().to_string();
            }
            let storage = Storage::open(std::path::Path::new(&config.db_path))?;
            let sessions = storage.resumable_sessions()?;
            if sessions.is_empty() {
                println!("no resumable sessions");
            }
            for s in sessions {
                println!(
                    "{:>6}  {:<40} started {}  pages={} queued={}",
                    s.id, s.start_url, s.start_time, s.pages_crawled, s.urls_in_queue
                );
            }
        }
    }

    Ok(())
}
