//! Scheduler for handing out frontier URLs and pacing requests
//!
//! This module handles:
//! - The shared work queue every crawl worker pulls from
//! - Politeness pacing between consecutive requests of a worker

use crate::crawler::frontier::CrawlCandidate;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Shared work queue for one crawl run
///
/// Workers call [`Scheduler::next`] until it returns `None`. Dispatch order is
/// the order of the candidates given to [`Scheduler::new`].
pub struct Scheduler {
    frontier: Mutex<VecDeque<CrawlCandidate>>,
}

impl Scheduler {
    /// Creates a scheduler over an already built frontier
    pub fn new(candidates: Vec<CrawlCandidate>) -> Self {
        Self {
            frontier: Mutex::new(candidates.into()),
        }
    }

    /// Takes the next candidate, or `None` once the frontier is drained
    pub fn next(&self) -> Option<CrawlCandidate> {
        // A poisoned queue only means another worker panicked mid-pop; the
        // remaining entries are still valid.
        let mut frontier = match self.frontier.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        frontier.pop_front()
    }

    /// Returns the number of URLs still waiting
    pub fn frontier_size(&self) -> usize {
        match self.frontier.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// Per-worker politeness pacing
///
/// Enforces a minimum delay between two requests issued by the same worker.
/// With every worker pacing itself, the pool as a whole issues at most
/// `parallelism` requests per delay window, regardless of host.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    last_request: Option<Instant>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: None,
        }
    }

    /// Time left before the next request may be issued, if any
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request?;
        let ready_at = last + self.delay;
        if now >= ready_at {
            None
        } else {
            Some(ready_at - now)
        }
    }

    /// Records that a request was issued at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.last_request = Some(now);
    }

    /// Sleeps until the next request is allowed, then records it
    pub async fn wait(&mut self) {
        if let Some(wait) = self.time_until_next_request(Instant::now()) {
            tracing::trace!("Pacing: sleeping {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.record_request(Instant::now());
    }
}
