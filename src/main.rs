//! immowatch - Immoweb listing watcher with Telegram notifications

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use immowatch::commands::{ScrapeCommand, WatchCommand};
use immowatch::config::Config;
use immowatch::immoweb::models::TransactionKind;
use immowatch::immoweb::query::{FilterSpec, PropertyCategory, QueryBuilder, SortOrder};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "immowatch",
    version,
    about = "Immoweb listing watcher with Telegram notifications",
    long_about = "Scrapes Immoweb listings matching a filter, diffs them against the stored \
                  snapshot, and sends a Telegram message for newly appeared listings."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Pacing delay between requests in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    /// Maximum number of listings per run
    #[arg(short, long, global = true)]
    max: Option<usize>,

    /// Snapshot store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Search filter flags shared by all subcommands.
#[derive(Args)]
struct FilterArgs {
    /// Property categories (comma-separated, e.g. house,apartment)
    #[arg(long, value_delimiter = ',')]
    category: Vec<PropertyCategory>,

    /// Transaction kind: rent or sale
    #[arg(short, long)]
    transaction: Option<TransactionKind>,

    /// Target cities (comma-separated)
    #[arg(long, value_delimiter = ',')]
    city: Vec<String>,

    /// Target postal codes (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    postal_code: Vec<u32>,

    /// Minimum price
    #[arg(long)]
    min_price: Option<u32>,

    /// Maximum price
    #[arg(long)]
    max_price: Option<u32>,

    /// Minimum bedroom count
    #[arg(long)]
    min_bedrooms: Option<u32>,

    /// Maximum bedroom count
    #[arg(long)]
    max_bedrooms: Option<u32>,

    /// Only immediately available listings
    #[arg(long)]
    available: bool,

    /// Result ordering: relevance, cheapest, most-expensive, newest, postal-code
    #[arg(short, long)]
    order: Option<SortOrder>,
}

impl FilterArgs {
    fn into_filter_spec(self, config: &Config) -> FilterSpec {
        FilterSpec {
            categories: self.category,
            transaction: self.transaction,
            country: Some(config.country.clone()),
            immediately_available: if self.available { Some(true) } else { None },
            min_bedrooms: self.min_bedrooms,
            max_bedrooms: self.max_bedrooms,
            min_price: self.min_price,
            max_price: self.max_price,
            cities: self.city,
            postal_codes: self.postal_code,
            order: self.order.unwrap_or_default(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape, reconcile against the stored snapshot, and notify
    #[command(alias = "w")]
    Watch {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Scrape once and print the snapshot as JSON (no store, no notification)
    #[command(alias = "s")]
    Scrape {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Print the query URL that would be fetched
    Url {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(max) = cli.max {
        config.max_results = max;
    }
    if let Some(store) = cli.store {
        config.store_path = Some(store);
    }

    match cli.command {
        Commands::Watch { filters } => {
            let filters = filters.into_filter_spec(&config);
            let cmd = WatchCommand::new(config);
            let output = cmd.execute(&filters).await?;
            println!("{}", output);
        }

        Commands::Scrape { filters } => {
            let filters = filters.into_filter_spec(&config);
            let cmd = ScrapeCommand::new(config);
            let output = cmd.execute(&filters).await?;
            println!("{}", output);
        }

        Commands::Url { filters } => {
            let filters = filters.into_filter_spec(&config);
            let builder = QueryBuilder::new(
                config.base_url.clone(),
                config.default_categories.clone(),
                config.default_transaction,
            );
            println!("{}", builder.build(&filters)?);
        }
    }

    Ok(())
}
