//! huginn: command-line client for the Hacker News item API.
//!
//! Resolves items, threads and the top stories feed through the cached,
//! bounded fetcher and prints them as JSON.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use huginn::config::Config;
use huginn::{Context, HuginnError, ItemId};

/// Huginn CLI
#[derive(Parser)]
#[command(name = "huginn")]
#[command(version = huginn::PKG_VERSION)]
#[command(about = "Fetch Hacker News items, threads and feeds")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "HUGINN_CONFIG")]
    config: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(short, long)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch one item with its full comment thread
    Item {
        /// Item id
        id: ItemId,
    },

    /// Fetch several items, in the order given
    Items {
        /// Item ids (space or comma separated)
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<ItemId>,
    },

    /// Fetch the current top stories
    Top {
        /// Number of stories
        #[arg(short, long, default_value_t = 30)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let gateway = config.builder().build()?;
    let ctx = Context::background().with_timeout(config.request_deadline());

    info!(version = huginn::PKG_VERSION, "huginn starting");

    match args.command {
        Command::Item { id } => {
            let thread = gateway.item_thread(&ctx, id).await?;
            print_json(&thread, args.pretty)?;
        }
        Command::Items { ids } => {
            let items = gateway.items(&ctx, &ids).await;
            if items.len() < ids.len() {
                eprintln!("resolved {} of {} items", items.len(), ids.len());
            }
            print_json(&items, args.pretty)?;
        }
        Command::Top { limit } => {
            if limit == 0 {
                return Err(HuginnError::InvalidInput("limit must be at least 1".into()).into());
            }
            let items = gateway.top_items(&ctx, limit).await?;
            print_json(&items, args.pretty)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), HuginnError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
