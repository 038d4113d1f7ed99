//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Tidepool index.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Searchable documents, one row per URL that yielded content.
-- FTS5 has no unique constraints; uniqueness on url is kept by upsert_page.
CREATE VIRTUAL TABLE IF NOT EXISTS pages USING fts5(
    url,
    title,
    body,
    crawled_at UNINDEXED,
    tokenize = 'porter'
);

-- Every URL ever requested or redirected to, with or without content
CREATE TABLE IF NOT EXISTS url_log (
    url TEXT PRIMARY KEY,
    last_seen TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
