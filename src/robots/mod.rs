//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files, and for checking crawl targets against them.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use crate::crawler::{fetch_url, Pacer};
use crate::url::normalize_url;
use crate::TidepoolError;
use reqwest::Client;
use url::Url;

/// Redirect hops followed when fetching robots.txt
pub const ROBOTS_MAX_REDIRECTS: u32 = 5;

/// Fetches and parses robots.txt for an origin
///
/// Redirects are followed for up to [`ROBOTS_MAX_REDIRECTS`] hops, so an
/// `http` origin that moved to `https` still yields its rules.
///
/// # Status Handling
///
/// | Response | Result |
/// |----------|--------|
/// | 2xx | Parse the body |
/// | 5xx | Disallow everything |
/// | anything else (4xx, broken or overlong redirect chain) | Allow everything |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `origin` - Serialized origin, e.g. `https://example.com:8443`
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - Rules to apply for this origin
/// * `Err(TidepoolError)` - The robots.txt request itself failed
pub async fn fetch_robots(client: &Client, origin: &str) -> Result<ParsedRobots, TidepoolError> {
    let robots_url = normalize_url(&format!("{}/robots.txt", origin))?;

    let response = match fetch_url(client, &robots_url, ROBOTS_MAX_REDIRECTS, |hop| {
        tracing::debug!("robots.txt for {} redirected to {}", origin, hop)
    })
    .await
    {
        Ok(response) => response,
        Err(
            e @ (TidepoolError::RedirectLoop { .. }
            | TidepoolError::RedirectLimit { .. }
            | TidepoolError::MissingLocation { .. }
            | TidepoolError::Url(_)),
        ) => {
            tracing::debug!("robots.txt for {} unavailable ({}), allowing", origin, e);
            return Ok(ParsedRobots::allow_all());
        }
        Err(e) => return Err(e),
    };

    match response.status {
        200..=299 => Ok(ParsedRobots::from_content(&String::from_utf8_lossy(
            &response.body,
        ))),
        500..=599 => {
            tracing::debug!(
                "robots.txt at {} returned {}, disallowing",
                response.final_url,
                response.status
            );
            Ok(ParsedRobots::disallow_all())
        }
        _ => Ok(ParsedRobots::allow_all()),
    }
}

/// Robots.txt gate shared by all crawl workers
pub struct RobotsPolicy {
    client: Client,
    agent: String,
    cache: RobotsCache,
}

impl RobotsPolicy {
    /// Creates a policy matching rules against `agent` (the crawler's product token)
    pub fn new(client: Client, agent: impl Into<String>) -> Self {
        Self {
            client,
            agent: agent.into(),
            cache: RobotsCache::new(),
        }
    }

    /// Checks whether `url` may be fetched
    ///
    /// robots.txt is fetched at most once per origin while the cached copy is
    /// fresh, after waiting on the calling worker's `pacer`. Two workers
    /// hitting a cold origin at the same time may both fetch it; the later
    /// result wins.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The URL is allowed
    /// * `Err(TidepoolError::RobotsDenied)` - The rules disallow the URL
    /// * `Err(_)` - robots.txt could not be fetched
    pub async fn check(&self, url: &Url, pacer: &mut Pacer) -> Result<(), TidepoolError> {
        let origin = url.origin().ascii_serialization();

        let robots = match self.cache.get(&origin) {
            Some(robots) => robots,
            None => {
                pacer.wait().await;
                tracing::debug!("Fetching robots.txt for {}", origin);
                let robots = fetch_robots(&self.client, &origin).await?;
                self.cache.insert(&origin, robots.clone());
                robots
            }
        };

        if robots.is_allowed(url.as_str(), &self.agent) {
            Ok(())
        } else {
            Err(TidepoolError::RobotsDenied {
                url: url.to_string(),
            })
        }
    }
}
