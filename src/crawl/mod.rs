//! Running crawls: seeding, the worker pool and run summaries.

mod driver;
mod events;
mod queue;
mod seeds;
mod summary;

use thiserror::Error;

use crate::config::ConfigError;
use crate::repository::StorageError;

pub use driver::Pipeline;
pub use events::CrawlEvent;
pub use queue::RequestQueue;
pub use seeds::{seed_requests, seed_values};
pub use summary::{AbortReason, EntityTally, RunState, RunSummary};

/// Errors that stop a crawl before it starts.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Queue storage error: {0}")]
    Queue(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
