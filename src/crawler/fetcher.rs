//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Single requests whose redirects the caller follows hop by hop
//! - Redirect target normalization, loop and chain length detection
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::url::normalize_url;
use crate::TidepoolError;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// A fully read response at the end of a redirect chain
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// URL the body was served from
    pub final_url: Url,
    /// HTTP status code of the final response
    pub status: u16,
    /// Raw Content-Type header value, empty when absent
    pub content_type: String,
    /// Response body bytes
    pub body: Vec<u8>,
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are disabled at the client level; callers follow them hop by
/// hop with [`fetch_once`] and [`RedirectChain`].
///
/// # Example
///
/// ```no_run
/// use tidepool::config::{CrawlerConfig, UserAgentConfig};
/// use tidepool::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(crawler.request_timeout_secs);

    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a transport error onto the crawl error taxonomy
fn request_error(url: &str, source: reqwest::Error) -> TidepoolError {
    if source.is_timeout() {
        TidepoolError::Timeout {
            url: url.to_string(),
        }
    } else {
        TidepoolError::Http {
            url: url.to_string(),
            source,
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Outcome of a single request
#[derive(Debug)]
pub enum FetchStep {
    /// A 3xx response; the normalized target is not requested yet
    Redirect(Url),
    /// Any other response, fully read
    Done(FetchedResponse),
}

/// Issues one request without following redirects
///
/// Redirect targets are resolved against `url` and normalized, so a
/// `Location` carrying a fragment names the same document as its seed form.
///
/// # Errors
///
/// | Condition | Error |
/// |-----------|-------|
/// | Request timed out | `Timeout` |
/// | Connection, TLS or body read failure | `Http` |
/// | Redirect without a resolvable Location | `MissingLocation` |
/// | Redirect to a non-http(s) or hostless URL | `Url` |
///
/// Non-2xx final statuses are not errors here; the caller decides.
pub async fn fetch_once(client: &Client, url: &Url) -> Result<FetchStep, TidepoolError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| request_error(url.as_str(), e))?;

    let status = response.status();
    if is_redirect(status) {
        let joined = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|location| url.join(location).ok())
            .ok_or_else(|| TidepoolError::MissingLocation {
                url: url.to_string(),
            })?;
        let next = normalize_url(joined.as_str())?;

        tracing::debug!("Redirect {} -> {} ({})", url, next, status.as_u16());
        return Ok(FetchStep::Redirect(next));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response
        .bytes()
        .await
        .map_err(|e| request_error(url.as_str(), e))?;

    Ok(FetchStep::Done(FetchedResponse {
        final_url: url.clone(),
        status: status.as_u16(),
        content_type,
        body: body.to_vec(),
    }))
}

/// Loop and length bookkeeping for one redirect chain
#[derive(Debug)]
pub struct RedirectChain {
    start: Url,
    visited: HashSet<String>,
    hops: u32,
    max_redirects: u32,
}

impl RedirectChain {
    pub fn new(start: &Url, max_redirects: u32) -> Self {
        Self {
            start: start.clone(),
            visited: HashSet::from([start.to_string()]),
            hops: 0,
            max_redirects,
        }
    }

    /// Accepts `next` as the following hop
    ///
    /// # Errors
    ///
    /// * `RedirectLoop` - `next` was already visited in this chain
    /// * `RedirectLimit` - accepting `next` would exceed `max_redirects`
    pub fn follow(&mut self, next: &Url) -> Result<(), TidepoolError> {
        self.hops += 1;
        if !self.visited.insert(next.to_string()) {
            return Err(TidepoolError::RedirectLoop {
                url: next.to_string(),
            });
        }
        if self.hops > self.max_redirects {
            return Err(TidepoolError::RedirectLimit {
                url: self.start.to_string(),
            });
        }
        Ok(())
    }
}

/// Fetches a URL, following up to `max_redirects` redirects
///
/// `on_redirect` is called with every redirect target before it is
/// requested, including a target that ends the chain with an error.
/// Errors are those of [`fetch_once`] and [`RedirectChain::follow`].
pub async fn fetch_url<F>(
    client: &Client,
    url: &Url,
    max_redirects: u32,
    mut on_redirect: F,
) -> Result<FetchedResponse, TidepoolError>
where
    F: FnMut(&Url),
{
    let mut chain = RedirectChain::new(url, max_redirects);
    let mut current = url.clone();

    loop {
        match fetch_once(client, &current).await? {
            FetchStep::Done(response) => return Ok(response),
            FetchStep::Redirect(next) => {
                on_redirect(&next);
                chain.follow(&next)?;
                current = next;
            }
        }
    }
}
