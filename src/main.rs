//! Persistent, multi-threaded web crawler with a durable SQLite-backed
//! frontier.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webcrawler::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let default_filter = if cli::is_verbose() {
        "webcrawler=debug"
    } else {
        "webcrawler=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
