//! Crawler module for fetching and indexing a URL list
//!
//! This module contains the frontier scheduler, including:
//! - URL list parsing, normalization and shuffling
//! - A bounded pool of workers with politeness pacing
//! - HTTP fetching with manual redirect handling
//! - The per-URL pipeline from recrawl gate to index upsert

mod coordinator;
mod fetcher;
mod frontier;
mod scheduler;

pub use coordinator::{recently_visited, Crawler};
pub use fetcher::{
    build_http_client, fetch_once, fetch_url, FetchStep, FetchedResponse, RedirectChain,
};
pub use frontier::{build_frontier, parse_url_list, read_url_list, CrawlCandidate, Frontier};
pub use scheduler::{Pacer, Scheduler};

use crate::config::Config;
use crate::extract::Extractor;
use crate::storage::IndexStore;
use crate::TidepoolError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Why a URL was not fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The url log shows a visit within the recrawl interval
    RecentlyVisited { last_seen: DateTime<Utc> },
    /// The URL already appeared earlier in the same list
    Duplicate,
}

/// Terminal state of one frontier URL
#[derive(Debug)]
pub enum Outcome {
    /// Content was extracted and written to the index
    Indexed { final_url: String, title: String },
    Skipped(SkipReason),
    Failed(TidepoolError),
}

impl Outcome {
    pub fn is_indexed(&self) -> bool {
        matches!(self, Outcome::Indexed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Outcome for a single input URL
#[derive(Debug)]
pub struct CrawlOutcome {
    /// The normalized URL, or the raw line when normalization failed
    pub url: String,
    pub outcome: Outcome,
}

/// Summary of one crawl run
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub outcomes: Vec<CrawlOutcome>,
    pub elapsed: Duration,
}

impl CrawlReport {
    /// Number of URLs whose content reached the index
    pub fn indexed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_indexed()).count()
    }

    /// Number of URLs skipped by the recrawl gate or as duplicates
    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_skipped()).count()
    }

    /// Number of URLs that failed at any stage
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_failed()).count()
    }

    /// Looks up the outcome recorded for a normalized input URL
    pub fn outcome_for(&self, url: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.url == url)
            .map(|o| &o.outcome)
    }
}

/// Runs a complete crawl over `urls`
///
/// This is the main entry point for indexing. It will:
/// 1. Normalize, deduplicate and shuffle the list
/// 2. Build the HTTP client and robots policy
/// 3. Run `parallelism` workers until the frontier is drained
/// 4. Return the per-URL outcomes
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `store` - The index store to write into
/// * `extractor` - Content extractor for fetched responses
/// * `urls` - Raw URL list entries
pub async fn crawl(
    config: &Config,
    store: Arc<dyn IndexStore>,
    extractor: Extractor,
    urls: &[String],
) -> Result<CrawlReport, TidepoolError> {
    let crawler = Arc::new(Crawler::new(config, store, extractor)?);
    Ok(crawler.run(urls).await)
}
