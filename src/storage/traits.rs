//! Storage traits and error types
//!
//! This module defines the trait interface for index backends and
//! associated error types.

use crate::storage::{IndexedPage, PageHit};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database connection lock was poisoned")]
    LockPoisoned,

    #[error("Invalid timestamp stored in database: {value}")]
    Timestamp { value: String },
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for index backend implementations
///
/// The crawler and the query path only ever touch persistence through this
/// trait. Implementations are shared between concurrent crawl workers and
/// the search server, so every method takes `&self` and must be safe to call
/// from several threads at once.
pub trait IndexStore: Send + Sync {
    // ===== Url Log =====

    /// Records that a URL was requested or redirected to at `seen_at`
    ///
    /// Always overwrites any previous timestamp for the URL.
    fn log_visit(&self, url: &str, seen_at: DateTime<Utc>) -> StoreResult<()>;

    /// Returns when a URL was last logged, or `None` if it never was
    fn last_visit(&self, url: &str) -> StoreResult<Option<DateTime<Utc>>>;

    /// Counts entries in the url log
    fn count_logged_urls(&self) -> StoreResult<u64>;

    // ===== Indexed Pages =====

    /// Inserts a page, or replaces title, body and timestamp of an existing one
    ///
    /// The existence check and the write happen in a single transaction, so
    /// concurrent callers never produce two rows for the same URL.
    fn upsert_page(
        &self,
        url: &str,
        title: &str,
        body: &str,
        crawled_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Gets a page by URL, including its body
    fn get_page(&self, url: &str) -> StoreResult<Option<IndexedPage>>;

    /// Counts indexed pages
    fn count_pages(&self) -> StoreResult<u64>;

    // ===== Retrieval =====

    /// Runs a query written in the store's own query grammar
    ///
    /// Hits are returned in relevance order and never carry body text.
    fn search(&self, query: &str) -> StoreResult<Vec<PageHit>>;
}
