//! Robots.txt caching implementation
//!
//! This module provides caching functionality for robots.txt files keyed by
//! origin, with automatic expiration after 24 hours.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Cached robots.txt data for an origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub content: ParsedRobots,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates a new CachedRobots instance stamped with the current time
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached robots.txt is older than 24 hours
    pub fn is_stale(&self) -> bool {
        Utc::now() - self.fetched_at > Duration::hours(24)
    }
}

/// Per-origin robots.txt cache shared by all crawl workers
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached rules for `origin` unless missing or stale
    pub fn get(&self, origin: &str) -> Option<ParsedRobots> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(origin)
            .filter(|cached| !cached.is_stale())
            .map(|cached| cached.content.clone())
    }

    /// Stores freshly fetched rules for `origin`
    pub fn insert(&self, origin: &str, robots: ParsedRobots) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(origin.to_string(), CachedRobots::new(robots));
        }
    }
}
