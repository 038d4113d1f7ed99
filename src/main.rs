//! Tidepool main entry point
//!
//! This is the command-line interface for building and querying the index.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tidepool::config::{load_config_with_hash, validate, Config};
use tidepool::crawler::{self, build_frontier, read_url_list, recently_visited};
use tidepool::storage::{open_store, IndexStore};
use tidepool::{Extractor, QueryEngine};
use tracing_subscriber::EnvFilter;

/// Tidepool: a small personal search engine
///
/// Tidepool fetches a list of URLs, converts HTML, PDF, and plain-text
/// responses to text, and keeps them in a full-text index that can be
/// searched from the terminal or a browser.
#[derive(Parser, Debug)]
#[command(name = "tidepool")]
#[command(version)]
#[command(about = "A small personal search engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every URL in a newline-delimited list and index the results
    Index {
        /// File with one URL per line; `#` starts a comment line
        #[arg(value_name = "URL_FILE")]
        url_file: PathBuf,

        /// Show which URLs would be fetched or skipped without fetching
        #[arg(long)]
        dry_run: bool,
    },

    /// Serve the search page over HTTP
    Serve {
        /// Listen address, overriding the config file
        #[arg(long, value_name = "ADDR")]
        address: Option<SocketAddr>,
    },

    /// Run a query and print the ranked results
    Search {
        #[arg(required = true, value_name = "QUERY")]
        query: Vec<String>,
    },

    /// Show index statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;

    let store = open_store(Path::new(&config.index.database_path)).with_context(|| {
        format!(
            "Failed to open index database {}",
            config.index.database_path
        )
    })?;
    let store: Arc<dyn IndexStore> = Arc::new(store);

    match cli.command {
        Command::Index { url_file, dry_run } => {
            let urls = read_url_list(&url_file)
                .with_context(|| format!("Failed to read URL list {}", url_file.display()))?;
            if dry_run {
                handle_dry_run(&config, store.as_ref(), &urls)?;
            } else {
                handle_index(&config, store, &urls).await?;
            }
        }
        Command::Serve { address } => handle_serve(&config, store, address).await?,
        Command::Search { query } => handle_search(store, &query.join(" "))?,
        Command::Stats => handle_stats(&config, store.as_ref())?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tidepool=info,warn"),
            1 => EnvFilter::new("tidepool=debug,info"),
            2 => EnvFilter::new("tidepool=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file, or validated defaults when none is given
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let config = Config::default();
            validate(&config).context("Invalid default configuration")?;
            Ok(config)
        }
    }
}

/// Handles `index --dry-run`: reports what a crawl would do without any network access
fn handle_dry_run(config: &Config, store: &dyn IndexStore, urls: &[String]) -> anyhow::Result<()> {
    println!("=== Tidepool Dry Run ===\n");

    let frontier = build_frontier(urls, false);
    let interval = config.crawler.recrawl_interval();
    let now = Utc::now();
    let mut due = 0;

    for candidate in &frontier.candidates {
        match recently_visited(store, candidate.url.as_str(), interval, now)? {
            Some(last_seen) => println!(
                "  skip   {} (last seen {})",
                candidate.url,
                last_seen.format("%Y-%m-%d %H:%M")
            ),
            None => {
                due += 1;
                println!("  fetch  {}", candidate.url);
            }
        }
    }

    for rejected in &frontier.rejected {
        println!("  reject {} ({:?})", rejected.url, rejected.outcome);
    }

    println!(
        "\n{} to fetch, {} recently visited, {} rejected",
        due,
        frontier.candidates.len() - due,
        frontier.rejected.len()
    );

    Ok(())
}

/// Handles `index`: runs the crawl and prints a summary
async fn handle_index(
    config: &Config,
    store: Arc<dyn IndexStore>,
    urls: &[String],
) -> anyhow::Result<()> {
    tracing::info!("Loaded {} URLs", urls.len());

    let extractor = Extractor::from_config(&config.converters);
    let report = crawler::crawl(config, store, extractor, urls)
        .await
        .context("Failed to start crawl")?;

    println!(
        "Indexed {}, skipped {}, failed {} in {:.1}s",
        report.indexed(),
        report.skipped(),
        report.failed(),
        report.elapsed.as_secs_f64()
    );

    Ok(())
}

/// Handles `serve`
async fn handle_serve(
    config: &Config,
    store: Arc<dyn IndexStore>,
    address: Option<SocketAddr>,
) -> anyhow::Result<()> {
    let address = match address {
        Some(address) => address,
        None => config
            .server
            .address
            .parse()
            .with_context(|| format!("Invalid server address {}", config.server.address))?,
    };

    let engine = QueryEngine::new(store);
    match engine.page_count() {
        Ok(pages) => tracing::info!("Serving search over {} indexed pages", pages),
        Err(e) => tracing::warn!("Could not count indexed pages: {}", e),
    }

    tidepool::server::serve(address, engine)
        .await
        .with_context(|| format!("Server error on {}", address))
}

/// Handles `search`: prints ranked results to stdout
fn handle_search(store: Arc<dyn IndexStore>, query: &str) -> anyhow::Result<()> {
    if query.trim().is_empty() {
        bail!("no query provided");
    }

    let results = QueryEngine::new(store).search(query)?;
    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        let title = if result.title.is_empty() {
            result.url.as_str()
        } else {
            result.title.as_str()
        };
        println!("{:>3}. {}", rank + 1, title);
        println!(
            "     {} ({}, {})",
            result.url,
            result.host,
            result.crawled_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

/// Handles `stats`: prints index statistics
fn handle_stats(config: &Config, store: &dyn IndexStore) -> anyhow::Result<()> {
    println!("Database: {}\n", config.index.database_path);
    println!("  Indexed pages: {}", store.count_pages()?);
    println!("  Logged URLs:   {}", store.count_logged_urls()?);
    Ok(())
}
