//! Frontier construction
//!
//! Reads the operator's URL list and turns it into the set of candidates a
//! crawl run works through.

use crate::crawler::{CrawlOutcome, Outcome, SkipReason};
use crate::url::normalize_url;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::path::Path;
use url::Url;

/// A URL awaiting fetch in the current run
///
/// Candidates are always fetched at depth 0: links found in their content
/// are never followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlCandidate {
    pub url: Url,
}

/// Candidates ready for dispatch plus the entries that never made it in
#[derive(Debug, Default)]
pub struct Frontier {
    pub candidates: Vec<CrawlCandidate>,
    pub rejected: Vec<CrawlOutcome>,
}

/// Parses a newline-delimited URL list
///
/// Lines are trimmed; blank lines and lines starting with `#` are ignored.
///
/// # Example
///
/// ```
/// use tidepool::crawler::parse_url_list;
///
/// let urls = parse_url_list("# seeds\nhttps://a.example/\n\n  https://b.example/doc.pdf\n");
/// assert_eq!(urls, vec!["https://a.example/", "https://b.example/doc.pdf"]);
/// ```
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads and parses a URL list file
pub fn read_url_list(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_url_list(&content))
}

/// Normalizes, deduplicates, and optionally shuffles a URL list
///
/// Shuffling spreads consecutive requests across hosts when the input is
/// sorted or grouped by domain. Entries that fail normalization become
/// failed outcomes; repeats of an already accepted URL become skipped ones.
pub fn build_frontier(urls: &[String], shuffle: bool) -> Frontier {
    let mut frontier = Frontier::default();
    let mut seen = HashSet::new();

    for raw in urls {
        match normalize_url(raw) {
            Ok(url) => {
                if seen.insert(url.to_string()) {
                    frontier.candidates.push(CrawlCandidate { url });
                } else {
                    tracing::debug!("Dropping duplicate frontier entry {}", url);
                    frontier.rejected.push(CrawlOutcome {
                        url: url.to_string(),
                        outcome: Outcome::Skipped(SkipReason::Duplicate),
                    });
                }
            }
            Err(e) => {
                tracing::warn!("Invalid URL {:?} in list: {}", raw, e);
                frontier.rejected.push(CrawlOutcome {
                    url: raw.clone(),
                    outcome: Outcome::Failed(e.into()),
                });
            }
        }
    }

    if shuffle {
        frontier.candidates.shuffle(&mut rand::thread_rng());
    }

    frontier
}
