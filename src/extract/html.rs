//! HTML title extraction

use crate::extract::ExtractError;
use scraper::{Html, Selector};

/// Picks a document title from HTML
///
/// Returns the text of the first `<title>` element; when that is missing or
/// blank, the text of the first `<h1>`. The result is whitespace-trimmed and
/// may be empty when neither element has text.
///
/// # Example
///
/// ```
/// use tidepool::extract::extract_title;
///
/// let html = "<html><head><title> Home </title></head><body><h1>Hi</h1></body></html>";
/// assert_eq!(extract_title(html).unwrap(), "Home");
/// ```
pub fn extract_title(html: &str) -> Result<String, ExtractError> {
    let document = Html::parse_document(html);

    for selector in ["title", "h1"] {
        let selector =
            Selector::parse(selector).map_err(|e| ExtractError::Markup(e.to_string()))?;

        let text = document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>())
            .unwrap_or_default();

        let text = text.trim();
        if !text.is_empty() {
            return Ok(text.to_string());
        }
    }

    Ok(String::new())
}
