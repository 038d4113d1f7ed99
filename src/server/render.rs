//! HTML rendering for the search pages
//!
//! All user-supplied and index-supplied text goes through [`escape_html`].

use crate::search::SearchResult;
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
form{margin-bottom:1.5rem}input[type=text]{width:70%}\
.result{margin-bottom:1.2rem}.meta{color:#666;font-size:.85rem}";

/// Escapes text for use in HTML content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, query: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>{style}</style>\n</head>\n<body>\n\
         <form action=\"/search\" method=\"get\">\
         <input type=\"text\" name=\"q\" value=\"{query}\" autofocus> \
         <input type=\"submit\" value=\"Search\"></form>\n{content}</body>\n</html>\n",
        title = escape_html(title),
        style = STYLE,
        query = escape_html(query),
    )
}

/// The landing page: just the search form
pub fn index_page() -> String {
    page("Tidepool", "", "")
}

/// A results page for `query`
pub fn results_page(query: &str, results: &[SearchResult]) -> String {
    let mut content = String::new();

    if results.is_empty() {
        content.push_str("<p>No results.</p>\n");
    } else {
        let _ = writeln!(
            content,
            "<p class=\"meta\">{} result{}</p>",
            results.len(),
            if results.len() == 1 { "" } else { "s" }
        );
    }

    for result in results {
        let title = if result.title.is_empty() {
            &result.url
        } else {
            &result.title
        };
        let _ = writeln!(
            content,
            "<div class=\"result\"><a href=\"{url}\">{title}</a><br>\
             <span class=\"meta\">{host} &middot; {date}</span></div>",
            url = escape_html(&result.url),
            title = escape_html(title),
            host = escape_html(&result.host),
            date = result.crawled_at.format("%Y-%m-%d"),
        );
    }

    page(&format!("{} - Tidepool", query), query, &content)
}
