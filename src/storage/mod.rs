//! Storage module for the search index
//!
//! This module owns all persistence:
//! - SQLite database initialization and schema management
//! - The url log used for recrawl gating
//! - Full-text indexed pages and ranked retrieval

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{IndexStore, StoreError, StoreResult};

use chrono::{DateTime, Utc};
use std::path::Path;

/// Opens the index database, creating it and its schema when missing
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_store(path: &Path) -> StoreResult<SqliteStore> {
    SqliteStore::open(path)
}

/// A searchable document derived from a successfully extracted response
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPage {
    pub url: String,
    pub title: String,
    pub body: String,
    pub crawled_at: DateTime<Utc>,
}

/// A single retrieval hit; body text is never loaded for hits
#[derive(Debug, Clone, PartialEq)]
pub struct PageHit {
    pub url: String,
    pub title: String,
    pub crawled_at: DateTime<Utc>,
}
