//! Data models shared between storage and the crawl coordinator.

mod frontier;
mod session;
mod stats;

pub use frontier::{FetchOutcome, FrontierEntry, UrlStatus};
pub use session::{Session, SessionStatus, SessionSummary};
pub use stats::SessionStats;
