//! Shared helper functions for CLI commands.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::crawl::{RunState, RunSummary};
use crate::http_client::RequestBudget;
use crate::rate_limit::RateLimitStats;
use crate::repository::{run_migrations, SqlitePool};

/// Create the data directory, migrate the database and return a pool for it.
pub async fn open_database(settings: &Settings) -> anyhow::Result<SqlitePool> {
    settings.ensure_directories()?;
    let url = settings.database_url();
    run_migrations(&url).await?;
    Ok(SqlitePool::new(&url))
}

pub fn spinner(message: String) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Print the outcome of a run. `verbose` adds one line per chain.
pub fn print_summary(summary: &RunSummary, verbose: bool) {
    let state = match summary.state {
        RunState::Done => style(summary.state.to_string()).green(),
        _ => style(summary.state.to_string()).yellow(),
    };
    println!(
        "\n{} {} ({})",
        style("Crawl").bold(),
        style(&summary.crawl).cyan(),
        state
    );

    let totals = summary.totals();
    println!("  {:<20} {}", "Entity:", summary.entity);
    println!("  {:<20} {}", "Chains:", summary.chains.len());
    println!("  {:<20} {}", "Pages:", totals.pages);
    println!("  {:<20} {}", "Records fetched:", totals.fetched);
    println!("  {:<20} {}", "Records saved:", style(totals.saved).green());
    if totals.dropped > 0 {
        println!("  {:<20} {}", "Records dropped:", style(totals.dropped).yellow());
    }
    if summary.decode_failures > 0 {
        println!("  {:<20} {}", "Undecodable pages:", style(summary.decode_failures).yellow());
    }
    if summary.rejected_pages > 0 {
        println!("  {:<20} {}", "Rejected pages:", style(summary.rejected_pages).yellow());
    }
    if summary.transport_failures > 0 {
        println!("  {:<20} {}", "Transport errors:", style(summary.transport_failures).red());
    }
    if summary.remaining > 0 {
        println!(
            "  {:<20} {} (continue with --resume)",
            "Left pending:", summary.remaining
        );
    }

    if verbose && summary.chains.len() > 1 {
        println!();
        for (chain, tally) in &summary.chains {
            println!(
                "  {:<16} {:>4} pages {:>6} fetched {:>6} saved {:>4} dropped",
                chain, tally.pages, tally.fetched, tally.saved, tally.dropped
            );
        }
    }
}

/// Request accounting lines printed under the run summary.
pub fn fetch_stats_lines(stats: &RateLimitStats, budget: &RequestBudget) -> Vec<String> {
    let mut lines = Vec::new();

    let issued = match budget.limit() {
        Some(limit) => format!("{} of {}", budget.issued(), limit),
        None => budget.issued().to_string(),
    };
    lines.push(format!("  {:<20} {}", "Requests issued:", issued));
    if budget.is_exhausted() {
        lines.push(format!(
            "  {:<20} {}",
            "Request budget:",
            style("spent").yellow()
        ));
    }

    if stats.rate_limit_hits > 0 {
        lines.push(format!(
            "  {:<20} {}",
            "Rate limited:",
            style(stats.rate_limit_hits).yellow()
        ));
    }
    if stats.in_backoff {
        lines.push(format!(
            "  {:<20} {:?}",
            "Backoff penalty:", stats.current_penalty
        ));
    }

    lines
}
