use crate::UrlError;
use url::Url;

/// Normalizes a URL before it enters the frontier
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace and parse; reject if malformed
/// 2. Only `http` and `https` schemes are accepted
/// 3. A host is required (the parser lowercases it)
/// 4. Empty path becomes `/`
/// 5. Remove fragment (everything after #)
///
/// Query strings, trailing slashes, and path case are left alone: two URLs
/// that differ in those parts may serve different documents.
///
/// # Examples
///
/// ```
/// use tidepool::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost),
    }

    if url.path().is_empty() {
        url.set_path("/");
    }

    url.set_fragment(None);

    Ok(url)
}
