//! Robots.txt parser implementation
//!
//! This module provides functionality for parsing robots.txt content using the robotstxt crate.

use robotstxt::DefaultMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    AllowAll,
    DisallowAll,
    Rules,
}

/// Parsed robots.txt data
///
/// This is a wrapper around the robotstxt crate's matcher, providing a
/// simplified interface for checking if URLs are allowed.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content
    content: String,
    mode: Mode,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            mode: Mode::Rules,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when a site has no robots.txt (any 4xx response).
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            mode: Mode::AllowAll,
        }
    }

    /// Creates a ParsedRobots that denies everything
    ///
    /// Used when robots.txt exists but the server failed to serve it (5xx).
    pub fn disallow_all() -> Self {
        Self {
            content: String::new(),
            mode: Mode::DisallowAll,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL (or path) to check
    /// * `user_agent` - The product token of the crawler (e.g. "tidepool")
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self.mode {
            Mode::AllowAll => true,
            Mode::DisallowAll => false,
            Mode::Rules if self.content.trim().is_empty() => true,
            Mode::Rules => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
            }
        }
    }
}
