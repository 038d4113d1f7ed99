//! Shared fixtures for the integration tests

use async_trait::async_trait;
use std::sync::Arc;
use tidepool::config::Config;
use tidepool::extract::{ExtractError, TextConverter};
use tidepool::{Crawler, Extractor, SqliteStore};

/// Stands in for pandoc: drops everything between `<` and `>`
pub struct TagStripper;

#[async_trait]
impl TextConverter for TagStripper {
    async fn convert(&self, input: &[u8]) -> Result<String, ExtractError> {
        let html = String::from_utf8_lossy(input);
        let mut text = String::new();
        let mut in_tag = false;
        for c in html.chars() {
            match c {
                '<' => in_tag = true,
                '>' => {
                    in_tag = false;
                    text.push(' ');
                }
                _ if !in_tag => text.push(c),
                _ => {}
            }
        }
        Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

/// Stands in for pdftotext: treats the document bytes as text
pub struct Passthrough;

#[async_trait]
impl TextConverter for Passthrough {
    async fn convert(&self, input: &[u8]) -> Result<String, ExtractError> {
        Ok(String::from_utf8_lossy(input).into_owned())
    }
}

/// A converter that always fails like a crashed child process
pub struct Broken;

#[async_trait]
impl TextConverter for Broken {
    async fn convert(&self, _input: &[u8]) -> Result<String, ExtractError> {
        Err(ExtractError::ConverterFailed {
            program: "broken".to_string(),
            status: Some(1),
            stderr: "boom".to_string(),
        })
    }
}

/// Configuration tuned for fast, deterministic tests
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.parallelism = 2;
    config.crawler.politeness_delay_ms = 0;
    config.crawler.respect_robots = false;
    config.crawler.shuffle = false;
    config.crawler.request_timeout_secs = 5;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

pub fn test_extractor() -> Extractor {
    Extractor::new(Arc::new(TagStripper), Arc::new(Passthrough))
}

/// Builds a crawler over a fresh in-memory store
pub fn test_crawler(config: &Config, extractor: Extractor) -> (Arc<Crawler>, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let crawler = Crawler::new(config, store.clone(), extractor).unwrap();
    (Arc::new(crawler), store)
}
