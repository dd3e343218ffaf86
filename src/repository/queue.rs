//! Persisted crawl queue.
//!
//! One row per unique key. Enqueueing an existing key is a no-op, so
//! repeated runs never duplicate visited work.

use std::collections::HashSet;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewQueueRow, QueueRow};
use super::pool::SqlitePool;
use super::util::now_rfc3339;
use super::StorageResult;
use crate::models::PageRequest;
use crate::schema::crawl_queue;

/// Lifecycle of a queued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Pending,
    Done,
    Failed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Row counts per status for one crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: u64,
    pub done: u64,
    pub failed: u64,
}

impl QueueCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.done + self.failed
    }
}

#[derive(Clone)]
pub struct QueueRepository {
    pool: SqlitePool,
}

impl QueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a pending row unless the key is already known.
    /// Returns whether a row was added.
    pub async fn enqueue(&self, request: &PageRequest) -> StorageResult<bool> {
        let now = now_rfc3339();
        let body = serde_json::to_string(request)?;
        let row = NewQueueRow {
            unique_key: &request.unique_key,
            crawl: &request.crawl,
            request: &body,
            status: QueueStatus::Pending.as_str(),
            created_at: &now,
            updated_at: &now,
        };

        let mut conn = self.pool.get().await?;
        let inserted = diesel::insert_or_ignore_into(crawl_queue::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(inserted > 0)
    }

    pub async fn mark(
        &self,
        unique_key: &str,
        status: QueueStatus,
        error: Option<&str>,
    ) -> StorageResult<()> {
        let now = now_rfc3339();
        let mut conn = self.pool.get().await?;
        diesel::update(crawl_queue::table.find(unique_key))
            .set((
                crawl_queue::status.eq(status.as_str()),
                crawl_queue::error.eq(error),
                crawl_queue::updated_at.eq(&now),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Pending requests of a crawl in insertion order.
    pub async fn pending(&self, crawl: &str) -> StorageResult<Vec<PageRequest>> {
        let mut conn = self.pool.get().await?;
        let rows: Vec<QueueRow> = crawl_queue::table
            .filter(crawl_queue::crawl.eq(crawl))
            .filter(crawl_queue::status.eq(QueueStatus::Pending.as_str()))
            .order((crawl_queue::created_at.asc(), crawl_queue::unique_key.asc()))
            .select(QueueRow::as_select())
            .load(&mut conn)
            .await?;

        rows.iter()
            .map(|row| serde_json::from_str(&row.request).map_err(Into::into))
            .collect()
    }

    /// Keys already fetched by earlier runs of a crawl.
    pub async fn done_keys(&self, crawl: &str) -> StorageResult<HashSet<String>> {
        let mut conn = self.pool.get().await?;
        let keys: Vec<String> = crawl_queue::table
            .filter(crawl_queue::crawl.eq(crawl))
            .filter(crawl_queue::status.eq(QueueStatus::Done.as_str()))
            .select(crawl_queue::unique_key)
            .load(&mut conn)
            .await?;
        Ok(keys.into_iter().collect())
    }

    /// Forget every row of a crawl. Returns the number removed.
    pub async fn clear(&self, crawl: &str) -> StorageResult<usize> {
        let mut conn = self.pool.get().await?;
        let removed = diesel::delete(crawl_queue::table.filter(crawl_queue::crawl.eq(crawl)))
            .execute(&mut conn)
            .await?;
        Ok(removed)
    }

    pub async fn counts(&self, crawl: &str) -> StorageResult<QueueCounts> {
        use diesel::dsl::count_star;

        let mut conn = self.pool.get().await?;
        let rows: Vec<(String, i64)> = crawl_queue::table
            .filter(crawl_queue::crawl.eq(crawl))
            .group_by(crawl_queue::status)
            .select((crawl_queue::status, count_star()))
            .load(&mut conn)
            .await?;

        let mut counts = QueueCounts::default();
        for (status, n) in rows {
            let n = n as u64;
            match QueueStatus::from_str(&status) {
                Some(QueueStatus::Pending) => counts.pending = n,
                Some(QueueStatus::Done) => counts.done = n,
                Some(QueueStatus::Failed) => counts.failed = n,
                None => {}
            }
        }
        Ok(counts)
    }
}
