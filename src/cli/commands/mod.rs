//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod crawl;
mod init;
mod list;
mod queue;
mod stats;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "apicrawl")]
#[command(about = "Resumable, rate-limited crawler for paginated JSON APIs")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing apicrawl.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// List configured crawls
    List,

    /// Run a crawl
    Crawl {
        /// Crawl name from the config file
        name: String,
        /// Continue from the persisted queue instead of starting over
        #[arg(long)]
        resume: bool,
        /// Maximum number of requests (0 = unlimited; default from config)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Number of concurrent workers (default from config)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Show stored record counts
    Stats,

    /// Inspect or reset persisted crawl queues
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
}

#[derive(Subcommand)]
enum QueueCommands {
    /// Show queue counts (all configured crawls if no name is given)
    Status {
        name: Option<String>,
    },
    /// Forget every queued request of a crawl
    Clear {
        name: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        target: cli.target,
    };
    let (settings, config) = load_settings(options).await?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings, &config).await,
        Commands::List => list::cmd_list(&config),
        Commands::Crawl {
            name,
            resume,
            limit,
            workers,
        } => {
            let options = crawl::CrawlOptions {
                resume,
                limit,
                workers,
                verbose: cli.verbose,
            };
            crawl::cmd_crawl(&settings, &config, &name, options).await
        }
        Commands::Stats => stats::cmd_stats(&settings, &config).await,
        Commands::Queue { command } => match command {
            QueueCommands::Status { name } => {
                queue::cmd_queue_status(&settings, &config, name.as_deref()).await
            }
            QueueCommands::Clear { name } => queue::cmd_queue_clear(&settings, &name).await,
        },
    }
}
