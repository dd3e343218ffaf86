//! Record counts.

use console::style;

use crate::cli::helpers::open_database;
use crate::config::{Config, Settings};
use crate::models::EntityKind;
use crate::repository::{QueueRepository, RecordRepository};

pub async fn cmd_stats(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    let pool = open_database(settings).await?;
    let records = RecordRepository::new(pool.clone());
    let queue = QueueRepository::new(pool);

    println!("\n{}", style("Stored records").bold());
    println!("{}", "-".repeat(40));
    for kind in EntityKind::ALL {
        println!(
            "  {:<12} {:<14} {}",
            kind.as_str(),
            kind.table_name(),
            records.count(kind).await?
        );
    }
    println!("  {:<12} {:<14} {}", "raw pages", "raw_pages", records.raw_page_count().await?);

    if !config.crawls.is_empty() {
        println!("\n{}", style("Queues").bold());
        println!("{}", "-".repeat(40));
        for crawl in &config.crawls {
            let counts = queue.counts(&crawl.name).await?;
            println!(
                "  {:<16} {} done, {} pending, {} failed",
                crawl.name, counts.done, counts.pending, counts.failed
            );
        }
    }

    Ok(())
}
