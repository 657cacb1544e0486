//! Persistent, multi-threaded web crawler with a durable SQLite-backed
//! frontier. A crawl can be interrupted at any point — process kill,
//! machine reboot — and resumed later from exactly where it left off.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod models;
pub mod pool;
pub mod storage;
pub mod urlutil;
