//! Pipeline driver.
//!
//! Workers pull requests from a shared de-duplicating queue, fetch them,
//! upsert the extracted records and enqueue the next page of the chain.
//! Page N+1 of a chain is only enqueued once page N has been processed, so
//! pages of one chain run strictly in order while different chains run
//! concurrently.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use super::events::CrawlEvent;
use super::queue::RequestQueue;
use super::summary::{AbortReason, EntityTally, RunState, RunSummary};
use super::CrawlError;
use crate::config::CrawlConfig;
use crate::extract::{extract_items, extract_record};
use crate::http_client::{FetchError, Fetcher, PageResult};
use crate::models::{PageRequest, RawPage};
use crate::pagination::Paginator;
use crate::repository::{QueueRepository, QueueStatus, Sink};

/// Shared state of one run.
struct Run {
    queue: RequestQueue,
    summary: Mutex<RunSummary>,
}

impl Run {
    /// Record the first abort reason and stop handing out requests.
    async fn abort(&self, reason: AbortReason) {
        {
            let mut summary = self.summary.lock().await;
            if !summary.is_aborted() {
                warn!("Aborting crawl {}: {}", summary.crawl, reason.as_str());
                summary.state = RunState::Aborted(reason);
            }
        }
        self.queue.close().await;
    }
}

/// What processing one page produced.
struct PageOutcome {
    item_count: Option<usize>,
    tally: EntityTally,
    next: Option<PageRequest>,
    end_reason: &'static str,
    status: QueueStatus,
}

impl PageOutcome {
    fn ended(reason: &'static str, status: QueueStatus) -> Self {
        Self {
            item_count: None,
            tally: EntityTally::default(),
            next: None,
            end_reason: reason,
            status,
        }
    }
}

/// Runs one crawl definition to completion.
#[derive(Clone)]
pub struct Pipeline {
    crawl: CrawlConfig,
    paginator: Paginator,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn Sink>,
    store: Option<QueueRepository>,
    workers: usize,
    events: Option<mpsc::Sender<CrawlEvent>>,
}

impl Pipeline {
    pub fn new(
        crawl: CrawlConfig,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn Sink>,
    ) -> Result<Self, CrawlError> {
        crawl.validate()?;
        Ok(Self {
            paginator: Paginator::for_crawl(&crawl),
            workers: crawl.concurrency,
            crawl,
            fetcher,
            sink,
            store: None,
            events: None,
        })
    }

    /// Persist the queue so an interrupted run can be resumed.
    pub fn with_queue_store(mut self, store: QueueRepository) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_events(mut self, events: mpsc::Sender<CrawlEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn crawl(&self) -> &CrawlConfig {
        &self.crawl
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Start a fresh run from the given seed requests.
    ///
    /// Queue rows left by earlier runs of this crawl are forgotten first.
    pub async fn run(&self, seeds: Vec<PageRequest>) -> Result<RunSummary, CrawlError> {
        if let Some(ref store) = self.store {
            let cleared = store.clear(&self.crawl.name).await?;
            if cleared > 0 {
                debug!("Cleared {} queue rows of {}", cleared, self.crawl.name);
            }
        }
        self.execute(seeds, HashSet::new()).await
    }

    /// Continue an interrupted run: fetch `pending` and skip every key in `done`.
    pub async fn resume(
        &self,
        pending: Vec<PageRequest>,
        done: HashSet<String>,
    ) -> Result<RunSummary, CrawlError> {
        info!(
            "Resuming {}: {} pending, {} already done",
            self.crawl.name,
            pending.len(),
            done.len()
        );
        self.execute(pending, done).await
    }

    async fn execute(
        &self,
        seeds: Vec<PageRequest>,
        done: HashSet<String>,
    ) -> Result<RunSummary, CrawlError> {
        let run = Arc::new(Run {
            queue: RequestQueue::new(),
            summary: Mutex::new(RunSummary::new(&self.crawl.name, self.crawl.entity)),
        });
        run.queue.mark_seen(done).await;

        let mut seeded = 0;
        for seed in seeds {
            if run.queue.push(seed.clone()).await {
                if let Some(ref store) = self.store {
                    store.enqueue(&seed).await?;
                }
                seeded += 1;
            }
        }
        info!(
            "{}: {} with {} requests",
            self.crawl.name,
            RunState::Seeded,
            seeded
        );

        let pipeline = Arc::new(self.clone());
        let mut handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let pipeline = pipeline.clone();
            let run = run.clone();
            handles.push(tokio::spawn(async move {
                while let Some(request) = run.queue.next().await {
                    pipeline.process(worker_id, &run, request).await;
                    run.queue.complete().await;
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Crawl worker failed: {}", e);
            }
        }

        let remaining = run.queue.remaining().await;
        let mut summary = run.summary.lock().await.clone();
        summary.remaining += remaining;
        if !summary.is_aborted() {
            debug!("{}: {}", self.crawl.name, RunState::Drained);
            summary.state = RunState::Done;
        }

        let totals = summary.totals();
        info!(
            "{}: {} after {} pages ({} fetched, {} saved, {} dropped)",
            self.crawl.name, summary.state, totals.pages, totals.fetched, totals.saved, totals.dropped
        );
        Ok(summary)
    }

    async fn process(&self, worker_id: usize, run: &Run, request: PageRequest) {
        let key = request.unique_key.clone();
        let chain = request.chain_label().to_string();

        debug!("{}: {}", key, RunState::Fetching);
        self.emit(CrawlEvent::Fetching {
            worker_id,
            unique_key: key.clone(),
        })
        .await;

        let result = match self.fetcher.fetch(&request).await {
            Ok(result) => result,
            Err(FetchError::BudgetExhausted) => {
                // left pending for a later --resume
                info!("Request budget spent before {}", key);
                run.summary.lock().await.remaining += 1;
                run.abort(AbortReason::BudgetExhausted).await;
                return;
            }
            Err(FetchError::Transport(message)) => {
                run.summary.lock().await.transport_failures += 1;
                self.emit(CrawlEvent::Failed {
                    worker_id,
                    unique_key: key.clone(),
                    error: message.clone(),
                })
                .await;
                self.mark(run, &key, QueueStatus::Failed, Some(&message)).await;

                if request.is_seed {
                    error!("Seed request {} failed: {}", key, message);
                    run.abort(AbortReason::SeedTransport).await;
                } else {
                    warn!("Request {} failed: {}", key, message);
                    self.chain_ended(&chain, "transport failure").await;
                }
                return;
            }
        };

        let outcome = self.handle_page(run, &request, &result).await;

        {
            let mut summary = run.summary.lock().await;
            let tally = summary.chain_mut(&chain);
            tally.pages += 1;
            tally.merge(&outcome.tally);
        }

        self.record_raw(&request, &result, outcome.item_count).await;

        match outcome.next {
            Some(next) => self.enqueue(run, next).await,
            None => self.chain_ended(&chain, outcome.end_reason).await,
        }

        let failure = (outcome.status == QueueStatus::Failed).then(|| format!("HTTP {}", result.status));
        self.mark(run, &key, outcome.status, failure.as_deref()).await;

        self.emit(CrawlEvent::PageDone {
            worker_id,
            unique_key: key,
            status: result.status,
            items: outcome.item_count.unwrap_or(0),
            saved: outcome.tally.saved as usize,
        })
        .await;
    }

    async fn handle_page(&self, run: &Run, request: &PageRequest, result: &PageResult) -> PageOutcome {
        let key = &request.unique_key;
        debug!("{}: {} (HTTP {})", key, RunState::Extracting, result.status);

        if !result.is_success() {
            warn!("{}: HTTP {}: {}", key, result.status, result.preview(200));
            run.summary.lock().await.rejected_pages += 1;
            return PageOutcome::ended("error status", QueueStatus::Failed);
        }

        let json = match result.json() {
            Some(json) => json,
            None => {
                warn!(
                    "{}: response is not JSON ({}): {}",
                    key,
                    result.decode_error().unwrap_or_default(),
                    result.preview(200)
                );
                run.summary.lock().await.decode_failures += 1;
                return PageOutcome::ended("undecodable response", QueueStatus::Done);
            }
        };

        if let Some(ref check) = self.crawl.success {
            if !check.matches(json) {
                warn!("{}: invalid response: {}", key, result.preview(200));
                run.summary.lock().await.rejected_pages += 1;
                return PageOutcome::ended("failed success check", QueueStatus::Done);
            }
        }

        let items = extract_items(json, &self.crawl.pagination.items_path);
        let tally = self.save_items(&items).await;
        info!(
            "{}: {} items, {} saved",
            key,
            items.len(),
            tally.saved
        );

        debug!("{}: {}", key, RunState::Paginating);
        let state = self.paginator.state_for(request, json, items.len());
        let next = self.paginator.next(request, &state);

        PageOutcome {
            item_count: Some(items.len()),
            tally,
            next,
            end_reason: "last page",
            status: QueueStatus::Done,
        }
    }

    /// Upsert every item; a bad item is dropped without affecting the rest.
    async fn save_items(&self, items: &[&Value]) -> EntityTally {
        let mut tally = EntityTally::default();
        for item in items {
            tally.fetched += 1;
            let record = match extract_record(self.crawl.entity, item, &self.crawl.key_paths) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Dropping item: {}", e);
                    tally.dropped += 1;
                    continue;
                }
            };
            match self.sink.upsert(&record).await {
                Ok(()) => tally.saved += 1,
                Err(e) => {
                    error!(
                        "Failed to save {} {}: {}",
                        record.entity(),
                        record.natural_key(),
                        e
                    );
                    tally.dropped += 1;
                }
            }
        }
        tally
    }

    async fn record_raw(&self, request: &PageRequest, result: &PageResult, item_count: Option<usize>) {
        let page = RawPage {
            crawl: request.crawl.clone(),
            unique_key: request.unique_key.clone(),
            url: request.url.clone(),
            status: result.status,
            content: result.body.clone(),
            item_count,
        };
        if let Err(e) = self.sink.record_raw(&page).await {
            error!("Failed to record raw page {}: {}", request.unique_key, e);
        }
    }

    async fn enqueue(&self, run: &Run, request: PageRequest) {
        let key = request.unique_key.clone();
        if !run.queue.push(request.clone()).await {
            debug!("{} already seen", key);
            return;
        }
        if let Some(ref store) = self.store {
            if let Err(e) = store.enqueue(&request).await {
                error!("Failed to persist {}: {}", key, e);
                run.abort(AbortReason::Queue).await;
            }
        }
    }

    async fn mark(&self, run: &Run, key: &str, status: QueueStatus, error: Option<&str>) {
        if let Some(ref store) = self.store {
            if let Err(e) = store.mark(key, status, error).await {
                error!("Failed to update queue row {}: {}", key, e);
                run.abort(AbortReason::Queue).await;
            }
        }
    }

    async fn chain_ended(&self, chain: &str, reason: &str) {
        info!("{}: chain {} ended ({})", self.crawl.name, chain, reason);
        self.emit(CrawlEvent::ChainEnded {
            chain: chain.to_string(),
            reason: reason.to_string(),
        })
        .await;
    }

    async fn emit(&self, event: CrawlEvent) {
        if let Some(ref tx) = self.events {
            let _ = tx.send(event).await;
        }
    }
}
