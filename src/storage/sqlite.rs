//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the IndexStore trait,
//! using an FTS5 table for pages and a plain keyed table for the url log.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{IndexStore, StoreError, StoreResult};
use crate::storage::{IndexedPage, PageHit};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// SQLite storage backend
///
/// Holds a single connection behind a mutex; clone the surrounding `Arc` to
/// share it between crawl workers and the search server.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) the index database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database or create the schema
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // A second process (e.g. `serve` while `index` runs) may hold the write lock briefly
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing and dry runs)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn parse_timestamp(value: String) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| StoreError::Timestamp { value })
}

impl IndexStore for SqliteStore {
    // ===== Url Log =====

    fn log_visit(&self, url: &str, seen_at: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO url_log (url, last_seen) VALUES (?1, ?2)
             ON CONFLICT(url) DO UPDATE SET last_seen = excluded.last_seen",
            params![url, format_timestamp(seen_at)],
        )?;
        Ok(())
    }

    fn last_visit(&self, url: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let raw: Option<String> = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT last_seen FROM url_log WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?
        };

        raw.map(parse_timestamp).transpose()
    }

    fn count_logged_urls(&self) -> StoreResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM url_log", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Indexed Pages =====

    fn upsert_page(
        &self,
        url: &str,
        title: &str,
        body: &str,
        crawled_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let crawled_at = format_timestamp(crawled_at);

        // IMMEDIATE takes the write lock up front so the existence check and
        // the write cannot interleave with another writer. Dropping the
        // transaction without commit rolls everything back.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT rowid FROM pages WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(rowid) => {
                tx.execute(
                    "UPDATE pages SET title = ?1, body = ?2, crawled_at = ?3 WHERE rowid = ?4",
                    params![title, body, crawled_at, rowid],
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO pages (url, title, body, crawled_at) VALUES (?1, ?2, ?3, ?4)",
                    params![url, title, body, crawled_at],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_page(&self, url: &str) -> StoreResult<Option<IndexedPage>> {
        let row: Option<(String, String, String, String)> = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT url, title, body, crawled_at FROM pages WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?
        };

        row.map(|(url, title, body, crawled_at)| {
            Ok(IndexedPage {
                url,
                title,
                body,
                crawled_at: parse_timestamp(crawled_at)?,
            })
        })
        .transpose()
    }

    fn count_pages(&self) -> StoreResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Retrieval =====

    fn search(&self, query: &str) -> StoreResult<Vec<PageHit>> {
        let rows: Vec<(String, String, String)> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT url, title, crawled_at FROM pages WHERE pages MATCH ?1
                 ORDER BY rank, rowid",
            )?;
            let rows = stmt
                .query_map(params![query], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        rows.into_iter()
            .map(|(url, title, crawled_at)| {
                Ok(PageHit {
                    url,
                    title,
                    crawled_at: parse_timestamp(crawled_at)?,
                })
            })
            .collect()
    }
}
