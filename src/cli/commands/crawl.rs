//! Crawl command.

use std::sync::Arc;

use console::style;
use tokio::sync::mpsc;

use crate::cli::helpers::{fetch_stats_lines, open_database, print_summary, spinner};
use crate::config::{Config, SeedConfig, Settings};
use crate::crawl::{seed_requests, seed_values, CrawlEvent, Pipeline};
use crate::http_client::{HttpFetcher, RequestBudget};
use crate::pagination::Paginator;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::repository::{DieselSink, QueueRepository, RecordRepository};

pub struct CrawlOptions {
    pub resume: bool,
    pub limit: Option<usize>,
    pub workers: Option<usize>,
    pub verbose: bool,
}

/// Run (or resume) a configured crawl.
pub async fn cmd_crawl(
    settings: &Settings,
    config: &Config,
    name: &str,
    options: CrawlOptions,
) -> anyhow::Result<()> {
    let crawl = config.crawl(name)?;
    let pool = open_database(settings).await?;
    let records = RecordRepository::new(pool.clone());
    let queue = QueueRepository::new(pool.clone());

    let (requests, done) = if options.resume {
        let pending = queue.pending(&crawl.name).await?;
        if pending.is_empty() {
            println!(
                "{} Nothing to resume for {}",
                style("!").yellow(),
                crawl.name
            );
            return Ok(());
        }
        (pending, Some(queue.done_keys(&crawl.name).await?))
    } else {
        let values = seed_values(&crawl.seeds, &records).await?;
        if values.is_empty() && !matches!(crawl.seeds, SeedConfig::Static { .. }) {
            println!(
                "{} No seed ids stored for {}; run the crawl that fills them first",
                style("!").yellow(),
                crawl.name
            );
            return Ok(());
        }
        let paginator = Paginator::for_crawl(&crawl);
        (seed_requests(&crawl, &paginator, &values), None)
    };

    let workers = options.workers.unwrap_or(crawl.concurrency).max(1);
    let limit = options
        .limit
        .unwrap_or_else(|| crawl.max_requests.resolve(requests.len()));
    let budget = RequestBudget::new(limit);
    let limiter = RateLimiter::with_config(RateLimitConfig::per_minute(crawl.requests_per_minute));
    let fetcher = HttpFetcher::new(
        &settings.client_options(),
        limiter.clone(),
        workers,
        budget.clone(),
    )?;

    println!(
        "{} {} ({} chains, {} workers, {} req/min, {})",
        style(if options.resume { "Resuming" } else { "Crawling" }).bold(),
        style(&crawl.name).cyan(),
        requests.len(),
        workers,
        crawl.requests_per_minute,
        if limit == 0 {
            "no request limit".to_string()
        } else {
            format!("limit {}", limit)
        }
    );

    let (event_tx, mut event_rx) = mpsc::channel::<CrawlEvent>(256);
    let pipeline = Pipeline::new(crawl, Arc::new(fetcher), Arc::new(DieselSink::new(pool)))?
        .with_queue_store(queue)
        .with_workers(workers)
        .with_events(event_tx);

    let pb = spinner("Starting...".to_string())?;
    let progress = {
        let pb = pb.clone();
        tokio::spawn(async move {
            let mut pages = 0usize;
            let mut saved = 0usize;
            while let Some(event) = event_rx.recv().await {
                match event {
                    CrawlEvent::Fetching { unique_key, .. } => {
                        pb.set_message(format!("{} pages, {} saved | {}", pages, saved, unique_key));
                    }
                    CrawlEvent::PageDone {
                        saved: page_saved, ..
                    } => {
                        pages += 1;
                        saved += page_saved;
                        pb.set_message(format!("{} pages, {} saved", pages, saved));
                    }
                    CrawlEvent::ChainEnded { chain, reason } => {
                        pb.println(format!("  {} {} ({})", style("·").dim(), chain, reason));
                    }
                    CrawlEvent::Failed {
                        unique_key, error, ..
                    } => {
                        pb.println(format!("  {} {}: {}", style("✗").red(), unique_key, error));
                    }
                }
            }
        })
    };

    let result = match done {
        Some(done) => pipeline.resume(requests, done).await,
        None => pipeline.run(requests).await,
    };
    // Dropping the pipeline closes the event channel.
    drop(pipeline);
    let _ = progress.await;
    pb.finish_and_clear();

    let summary = result?;
    print_summary(&summary, options.verbose);
    for line in fetch_stats_lines(&limiter.get_stats().await, &budget) {
        println!("{}", line);
    }

    if summary.is_aborted() {
        anyhow::bail!("crawl {} aborted: {}", summary.crawl, summary.state);
    }
    Ok(())
}
