//! In-memory request queue shared by the workers.
//!
//! Keys are remembered once pushed, so re-enqueueing a key already seen in
//! this run (or marked done by an earlier one) is a no-op. Workers wait while
//! the queue is empty but requests are still in flight, since those may
//! enqueue follow-up pages.

use std::collections::{HashSet, VecDeque};

use tokio::sync::{Mutex, Notify};

use crate::models::PageRequest;

#[derive(Default)]
struct Inner {
    pending: VecDeque<PageRequest>,
    seen: HashSet<String>,
    in_flight: usize,
    closed: bool,
}

#[derive(Default)]
pub struct RequestQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat keys as already visited.
    pub async fn mark_seen(&self, keys: impl IntoIterator<Item = String>) {
        let mut inner = self.inner.lock().await;
        inner.seen.extend(keys);
    }

    /// Add a request unless its key was seen. Returns whether it was added.
    pub async fn push(&self, request: PageRequest) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.seen.insert(request.unique_key.clone()) {
            return false;
        }
        inner.pending.push_back(request);
        drop(inner);
        self.notify.notify_waiters();
        true
    }

    /// Next request to fetch, or `None` once the queue is drained or closed.
    ///
    /// Every request handed out must be followed by [`complete`](Self::complete).
    pub async fn next(&self) -> Option<PageRequest> {
        loop {
            let notified = self.notify.notified();
            {
                let mut inner = self.inner.lock().await;
                if inner.closed {
                    return None;
                }
                if let Some(request) = inner.pending.pop_front() {
                    inner.in_flight += 1;
                    return Some(request);
                }
                if inner.in_flight == 0 {
                    return None;
                }
            }
            notified.await;
        }
    }

    pub async fn complete(&self) {
        let mut inner = self.inner.lock().await;
        inner.in_flight = inner.in_flight.saturating_sub(1);
        drop(inner);
        self.notify.notify_waiters();
    }

    /// Stop handing out requests. In-flight requests still complete.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        drop(inner);
        self.notify.notify_waiters();
    }

    /// Requests enqueued but never handed out.
    pub async fn remaining(&self) -> usize {
        self.inner.lock().await.pending.len()
    }
}
