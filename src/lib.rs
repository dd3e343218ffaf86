//! apicrawl - resumable, rate-limited crawler for paginated JSON APIs.
//!
//! A crawl walks one endpoint page by page, maps every item to a typed
//! record and upserts it into SQLite. The request queue is persisted so an
//! interrupted run picks up where it stopped.

pub mod cli;
pub mod config;
pub mod crawl;
pub mod extract;
pub mod http_client;
pub mod migrations;
pub mod models;
pub mod pagination;
pub mod rate_limit;
pub mod repository;
pub mod schema;
