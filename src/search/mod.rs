//! Query engine over the index store
//!
//! Free-form user text is turned into a match expression that the full-text
//! engine cannot misparse: every whitespace-separated term is quoted, so
//! operators, parentheses, and column filters in the input are matched as
//! literal text.

use crate::storage::{IndexStore, StoreError};
use crate::url::display_host;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by [`QueryEngine::search`]
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("no query provided")]
    EmptyQuery,

    #[error("Index query failed: {0}")]
    Store(#[from] StoreError),
}

/// One ranked result with display fields
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub crawled_at: DateTime<Utc>,
    /// Host (and non-default port) of `url`, for display
    pub host: String,
}

/// Builds a safe match expression from raw user input
///
/// Each term is wrapped in double quotes with embedded quotes doubled.
/// Returns `None` when the input holds no terms.
///
/// # Example
///
/// ```
/// use tidepool::search::sanitize_query;
///
/// assert_eq!(sanitize_query("rust async").unwrap(), "\"rust\" \"async\"");
/// assert_eq!(sanitize_query("   "), None);
/// ```
pub fn sanitize_query(raw: &str) -> Option<String> {
    let terms: Vec<String> = raw
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

/// Read-only query front end shared by the CLI and the HTTP server
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn IndexStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self { store }
    }

    /// Runs a user query and returns results best match first
    ///
    /// Ties in relevance keep the order pages were first indexed, so the
    /// same query against an unchanged index always returns the same list.
    pub fn search(&self, raw: &str) -> Result<Vec<SearchResult>, QueryError> {
        let query = sanitize_query(raw).ok_or(QueryError::EmptyQuery)?;
        tracing::debug!("Searching for {}", query);

        let hits = self.store.search(&query)?;
        Ok(hits
            .into_iter()
            .map(|hit| SearchResult {
                host: display_host(&hit.url),
                title: hit.title,
                url: hit.url,
                crawled_at: hit.crawled_at,
            })
            .collect())
    }

    /// Number of indexed pages, for status output
    pub fn page_count(&self) -> Result<u64, QueryError> {
        Ok(self.store.count_pages()?)
    }
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine").finish_non_exhaustive()
    }
}
