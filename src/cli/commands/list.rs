//! List configured crawls.

use console::style;

use crate::config::{Config, SeedConfig};

pub fn cmd_list(config: &Config) -> anyhow::Result<()> {
    if config.crawls.is_empty() {
        println!("{} No crawls configured", style("!").yellow());
        return Ok(());
    }

    println!(
        "{:<16} {:<10} {:<6} {:<6} {:<12} URL",
        "NAME", "ENTITY", "METHOD", "POLICY", "SEEDS"
    );
    for crawl in &config.crawls {
        let seeds = match &crawl.seeds {
            SeedConfig::Static { values } if values.is_empty() => "-".to_string(),
            SeedConfig::Static { values } => format!("{} static", values.len()),
            SeedConfig::Fans => "fans".to_string(),
            SeedConfig::Profiles => "profiles".to_string(),
        };
        println!(
            "{:<16} {:<10} {:<6} {:<6} {:<12} {}",
            style(&crawl.name).cyan(),
            crawl.entity,
            crawl.method.as_str(),
            crawl.pagination.policy.as_str(),
            seeds,
            crawl.url
        );
    }

    Ok(())
}
