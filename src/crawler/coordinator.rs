//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drives a crawl run, including:
//! - Handing frontier URLs to a bounded set of workers
//! - Gating URLs and every redirect hop on the url log and robots.txt
//! - Fetching, extracting, and writing pages to the index
//! - Collecting per-URL outcomes into a report

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{
    build_http_client, fetch_once, FetchStep, FetchedResponse, RedirectChain,
};
use crate::crawler::frontier::{build_frontier, CrawlCandidate};
use crate::crawler::scheduler::{Pacer, Scheduler};
use crate::crawler::{CrawlOutcome, CrawlReport, Outcome, SkipReason};
use crate::extract::Extractor;
use crate::robots::RobotsPolicy;
use crate::storage::{IndexStore, StoreResult};
use crate::TidepoolError;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// Checks the url log for a visit inside the recrawl window
///
/// # Returns
///
/// * `Ok(Some(last_seen))` - The URL was seen less than `interval` ago
/// * `Ok(None)` - The URL is due (never seen, or seen long enough ago)
pub fn recently_visited(
    store: &dyn IndexStore,
    url: &str,
    interval: Duration,
    now: DateTime<Utc>,
) -> StoreResult<Option<DateTime<Utc>>> {
    let last_seen = store.last_visit(url)?;
    Ok(last_seen.filter(|seen| now - *seen < interval))
}

/// Main crawler structure
///
/// One `Crawler` can run several crawls; each [`Crawler::run`] builds its own
/// frontier while the robots cache is shared across runs.
pub struct Crawler {
    config: CrawlerConfig,
    client: Client,
    store: Arc<dyn IndexStore>,
    extractor: Extractor,
    robots: Option<RobotsPolicy>,
}

impl Crawler {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `config` - The loaded configuration
    /// * `store` - Index store shared by all workers
    /// * `extractor` - Content extractor shared by all workers
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(TidepoolError)` - The HTTP client could not be built
    pub fn new(
        config: &Config,
        store: Arc<dyn IndexStore>,
        extractor: Extractor,
    ) -> Result<Self, TidepoolError> {
        let client = build_http_client(&config.crawler, &config.user_agent)
            .map_err(TidepoolError::Client)?;

        let robots = config
            .crawler
            .respect_robots
            .then(|| RobotsPolicy::new(client.clone(), config.user_agent.crawler_name.clone()));

        Ok(Self {
            config: config.crawler.clone(),
            client,
            store,
            extractor,
            robots,
        })
    }

    /// Crawls every URL in `urls` and returns the per-URL outcomes
    ///
    /// Per-URL failures never abort the run; they are recorded in the report.
    pub async fn run(self: &Arc<Self>, urls: &[String]) -> CrawlReport {
        let start_time = Instant::now();

        let frontier = build_frontier(urls, self.config.shuffle);
        let mut outcomes = frontier.rejected;
        let scheduler = Arc::new(Scheduler::new(frontier.candidates));

        let workers = self.config.parallelism.max(1);
        tracing::info!(
            "Starting crawl of {} URLs with {} workers",
            scheduler.frontier_size(),
            workers
        );

        let mut pool = JoinSet::new();
        for id in 0..workers {
            pool.spawn(Arc::clone(self).worker(id, Arc::clone(&scheduler)));
        }

        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(mut finished) => outcomes.append(&mut finished),
                Err(e) => tracing::error!("Crawl worker failed: {}", e),
            }
        }

        let report = CrawlReport {
            outcomes,
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Crawl completed: {} indexed, {} skipped, {} failed in {:?}",
            report.indexed(),
            report.skipped(),
            report.failed(),
            report.elapsed
        );

        report
    }

    /// Pulls candidates until the frontier is drained
    async fn worker(self: Arc<Self>, id: u32, scheduler: Arc<Scheduler>) -> Vec<CrawlOutcome> {
        let mut pacer = Pacer::new(std::time::Duration::from_millis(
            self.config.politeness_delay_ms,
        ));
        let mut outcomes = Vec::new();

        while let Some(candidate) = scheduler.next() {
            let outcome = match self.process_url(&candidate, &mut pacer).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    log_failure(&candidate.url, &e);
                    Outcome::Failed(e)
                }
            };

            outcomes.push(CrawlOutcome {
                url: candidate.url.to_string(),
                outcome,
            });
        }

        tracing::debug!("Worker {} finished after {} URLs", id, outcomes.len());
        outcomes
    }

    /// Processes a single URL
    ///
    /// This method:
    /// 1. Skips the URL if the url log shows a recent visit
    /// 2. Checks robots.txt
    /// 3. Fetches the URL, logging and robots-checking every redirect hop
    /// 4. Extracts title and body from a 200 response
    /// 5. Logs the final URL and upserts the page
    async fn process_url(
        &self,
        candidate: &CrawlCandidate,
        pacer: &mut Pacer,
    ) -> Result<Outcome, TidepoolError> {
        let url = &candidate.url;

        let key = url.to_string();
        let interval = self.config.recrawl_interval();
        let recent = self
            .with_store(move |store| recently_visited(store, &key, interval, Utc::now()))
            .await?;
        if let Some(last_seen) = recent {
            tracing::debug!("Skipping {}: last seen {}", url, last_seen);
            return Ok(Outcome::Skipped(SkipReason::RecentlyVisited { last_seen }));
        }

        if let Some(robots) = &self.robots {
            robots.check(url, pacer).await?;
        }

        let response = self.fetch(url, pacer).await?;

        tracing::debug!("Got {} from {}", response.status, response.final_url);
        if response.status != 200 {
            return Err(TidepoolError::HttpStatus {
                url: response.final_url.to_string(),
                status: response.status,
            });
        }

        let FetchedResponse {
            final_url,
            content_type,
            body,
            ..
        } = response;
        let extracted = self
            .extractor
            .extract(&content_type, &body, &final_url)
            .await?;

        let key = final_url.to_string();
        let title = extracted.title.clone();
        let crawled_at = Utc::now();
        self.with_store(move |store| {
            store.log_visit(&key, crawled_at)?;
            store.upsert_page(&key, &title, &extracted.body, crawled_at)
        })
        .await?;

        tracing::info!("Indexed {} ({:?})", final_url, extracted.title);
        Ok(Outcome::Indexed {
            final_url: final_url.to_string(),
            title: extracted.title,
        })
    }

    /// Requests `url` and follows its redirects one paced hop at a time
    ///
    /// Every hop target is logged before it is checked, so a chain that ends
    /// in an error still leaves its hops in the url log.
    async fn fetch(&self, url: &Url, pacer: &mut Pacer) -> Result<FetchedResponse, TidepoolError> {
        let mut chain = RedirectChain::new(url, self.config.max_redirects);
        let mut current = url.clone();
        self.log_request(&current).await;

        loop {
            pacer.wait().await;
            tracing::info!("Visiting {}", current);

            match fetch_once(&self.client, &current).await? {
                FetchStep::Done(response) => return Ok(response),
                FetchStep::Redirect(next) => {
                    self.log_request(&next).await;
                    chain.follow(&next)?;
                    if let Some(robots) = &self.robots {
                        robots.check(&next, pacer).await?;
                    }
                    current = next;
                }
            }
        }
    }

    /// Records an outgoing request in the url log
    ///
    /// A failed write only costs recrawl accuracy, so the fetch goes ahead.
    async fn log_request(&self, url: &Url) {
        let key = url.to_string();
        if let Err(e) = self
            .with_store(move |store| store.log_visit(&key, Utc::now()))
            .await
        {
            tracing::error!("Failed to log visit to {}: {}", url, e);
        }
    }

    /// Runs a store operation on the blocking pool
    async fn with_store<T, F>(&self, op: F) -> Result<T, TidepoolError>
    where
        F: FnOnce(&dyn IndexStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| TidepoolError::Task(e.to_string()))?;
        Ok(result?)
    }
}

fn log_failure(url: &Url, error: &TidepoolError) {
    match error {
        TidepoolError::Store(_) | TidepoolError::Task(_) => {
            tracing::error!("Failed to crawl {}: {}", url, error)
        }
        TidepoolError::Extract(e) if !e.is_unsupported_media_type() => {
            tracing::error!("Failed to extract {}: {}", url, e)
        }
        TidepoolError::RobotsDenied { .. } => {
            tracing::info!("Skipping {}: disallowed by robots.txt", url)
        }
        _ => tracing::warn!("Failed to crawl {}: {}", url, error),
    }
}
