//! URL handling module for Tidepool
//!
//! This module provides URL normalization for the crawl frontier and host
//! extraction for search result display.

mod normalize;

pub use normalize::normalize_url;

use percent_encoding::percent_decode_str;
use url::Url;

/// Returns the host (with explicit port, if any) of a URL for display
///
/// A URL that fails to parse yields an empty string rather than an error,
/// since the value is only ever shown to users.
///
/// # Examples
///
/// ```
/// use tidepool::url::display_host;
///
/// assert_eq!(display_host("https://example.com/page"), "example.com");
/// assert_eq!(display_host("http://127.0.0.1:8080/"), "127.0.0.1:8080");
/// assert_eq!(display_host("::not a url::"), "");
/// ```
pub fn display_host(url_str: &str) -> String {
    let Ok(url) = Url::parse(url_str) else {
        return String::new();
    };

    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Returns the last segment of a URL path, used as a fallback document title
///
/// Trailing slashes are ignored; a path made only of slashes yields `/`.
/// The segment is percent-decoded, with invalid UTF-8 replaced.
pub fn path_basename(url: &Url) -> String {
    let trimmed = url.path().trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
