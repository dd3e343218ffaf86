//! Progress events emitted while a crawl runs.

/// Events emitted by the pipeline. Consumers use them for progress display.
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    /// A request is about to be fetched.
    Fetching { worker_id: usize, unique_key: String },
    /// A page was processed.
    PageDone {
        worker_id: usize,
        unique_key: String,
        status: u16,
        items: usize,
        saved: usize,
    },
    /// A chain ended.
    ChainEnded { chain: String, reason: String },
    /// A request failed at the transport level.
    Failed {
        worker_id: usize,
        unique_key: String,
        error: String,
    },
}
