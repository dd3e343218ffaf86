//! SQLite persistence: entity upserts, raw page audit and the crawl queue.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queue;
pub mod records;
pub mod sink;
pub mod util;

use thiserror::Error;

pub use migrations::run_migrations;
pub use pool::{DieselError, SqlitePool};
pub use queue::{QueueCounts, QueueRepository, QueueStatus};
pub use records::RecordRepository;
pub use sink::{DieselSink, Sink};

/// Storage errors. Upsert failures drop one record; queue failures abort a run.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;
