//! Persisted queue commands.

use console::style;

use crate::cli::helpers::open_database;
use crate::config::{Config, Settings};
use crate::repository::QueueRepository;

pub async fn cmd_queue_status(
    settings: &Settings,
    config: &Config,
    name: Option<&str>,
) -> anyhow::Result<()> {
    let queue = QueueRepository::new(open_database(settings).await?);

    let names: Vec<&str> = match name {
        Some(name) => vec![name],
        None => config.crawls.iter().map(|c| c.name.as_str()).collect(),
    };
    if names.is_empty() {
        println!("{} No crawls configured", style("!").yellow());
        return Ok(());
    }

    for name in names {
        let counts = queue.counts(name).await?;
        let status = if counts.total() == 0 {
            style("Not Started").dim().to_string()
        } else if counts.pending > 0 {
            style("Needs Resume").yellow().to_string()
        } else {
            style("Complete").green().to_string()
        };

        println!("\n{}", style(format!("Queue: {}", name)).bold());
        println!("{}", "-".repeat(40));
        println!("  {:<12} {}", "Status:", status);
        println!("  {:<12} {}", "Done:", counts.done);
        println!("  {:<12} {}", "Pending:", counts.pending);
        println!("  {:<12} {}", "Failed:", counts.failed);
    }

    Ok(())
}

pub async fn cmd_queue_clear(settings: &Settings, name: &str) -> anyhow::Result<()> {
    let queue = QueueRepository::new(open_database(settings).await?);
    let removed = queue.clear(name).await?;
    println!(
        "{} Cleared {} queued requests of {}",
        style("✓").green(),
        removed,
        name
    );
    Ok(())
}
