//! Content extraction
//!
//! Turns a fetched response into a title and a normalized plain-text body,
//! dispatching on the declared media type:
//!
//! | media type        | body                         | title                      |
//! |-------------------|------------------------------|----------------------------|
//! | `text/html`       | HTML converter               | first `<title>` or `<h1>`  |
//! | `application/pdf` | PDF converter                | basename of the URL path   |
//! | `text/plain`      | bytes decoded as UTF-8       | basename of the URL path   |
//! | anything else     | not extracted                | not extracted              |

mod converter;
mod html;

pub use converter::{CommandConverter, TextConverter};
pub use html::extract_title;

use crate::config::ConvertersConfig;
use crate::url::path_basename;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur while extracting text from a response
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported media type: {0:?}")]
    UnsupportedMediaType(String),

    #[error("Failed to start converter {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Converter {program} exited with status {status:?}: {stderr}")]
    ConverterFailed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Converter {program} killed after running for {timeout:?}")]
    ConverterTimeout { program: String, timeout: Duration },

    #[error("I/O error talking to converter {program}: {source}")]
    ConverterIo {
        program: String,
        source: std::io::Error,
    },

    #[error("Markup error: {0}")]
    Markup(String),
}

impl ExtractError {
    /// True when the response was simply of a kind that is never indexed
    pub fn is_unsupported_media_type(&self) -> bool {
        matches!(self, ExtractError::UnsupportedMediaType(_))
    }
}

/// Title and body extracted from one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub title: String,
    pub body: String,
}

/// Returns the lowercase `type/subtype` of a Content-Type header value
///
/// Parameters such as `charset` are dropped. A missing header yields an empty
/// string, which no extractor handles.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Media-type dispatcher over two text converters
#[derive(Clone)]
pub struct Extractor {
    html: Arc<dyn TextConverter>,
    pdf: Arc<dyn TextConverter>,
}

impl Extractor {
    /// Creates an extractor from explicit HTML and PDF converters
    pub fn new(html: Arc<dyn TextConverter>, pdf: Arc<dyn TextConverter>) -> Self {
        Self { html, pdf }
    }

    /// Creates an extractor that runs the configured external programs
    pub fn from_config(config: &ConvertersConfig) -> Self {
        let timeout = config.converter_timeout();
        Self::new(
            Arc::new(CommandConverter::pandoc(config.pandoc_path.clone()).with_timeout(timeout)),
            Arc::new(
                CommandConverter::pdftotext(config.pdftotext_path.clone()).with_timeout(timeout),
            ),
        )
    }

    /// Extracts a title and body from a response
    ///
    /// # Arguments
    ///
    /// * `content_type` - The response's Content-Type header (parameters are ignored)
    /// * `body` - Raw response bytes
    /// * `url` - The URL the response was served from, used for fallback titles
    ///
    /// # Returns
    ///
    /// * `Ok(Extracted)` - Extracted title and plain-text body
    /// * `Err(ExtractError)` - Unsupported media type or converter failure
    pub async fn extract(
        &self,
        content_type: &str,
        body: &[u8],
        url: &Url,
    ) -> Result<Extracted, ExtractError> {
        match media_type(content_type).as_str() {
            "text/html" => {
                let text = self.html.convert(body).await?;
                let title = extract_title(&String::from_utf8_lossy(body))?;
                Ok(Extracted { title, body: text })
            }
            "application/pdf" => {
                let text = self.pdf.convert(body).await?;
                Ok(Extracted {
                    title: path_basename(url),
                    body: text,
                })
            }
            "text/plain" => Ok(Extracted {
                title: path_basename(url),
                body: String::from_utf8_lossy(body).into_owned(),
            }),
            _ => Err(ExtractError::UnsupportedMediaType(content_type.to_string())),
        }
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor").finish_non_exhaustive()
    }
}
