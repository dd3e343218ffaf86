//! Initialize command.

use console::style;

use crate::cli::helpers::open_database;
use crate::config::{Config, Settings};

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    open_database(settings).await?;

    if config.crawls.is_empty() {
        println!("{} No crawls configured", style("!").yellow());
        println!("  Copy demos/apicrawl.example.toml to apicrawl.toml to get started");
    } else {
        println!(
            "  {} {} crawls configured",
            style("✓").green(),
            config.crawls.len()
        );
    }

    println!(
        "{} Initialized apicrawl in {}",
        style("✓").green(),
        settings.database_path().display()
    );

    Ok(())
}
