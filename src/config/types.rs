use serde::Deserialize;

/// Main configuration structure for Tidepool
///
/// Every section may be omitted from the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub converters: ConvertersConfig,
    pub index: IndexConfig,
    pub server: ServerConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of concurrent fetch workers
    pub parallelism: u32,

    /// Minimum time between two requests issued by the same worker (milliseconds)
    #[serde(rename = "politeness-delay-ms")]
    pub politeness_delay_ms: u64,

    /// Maximum number of redirect hops followed for one URL
    #[serde(rename = "max-redirects")]
    pub max_redirects: u32,

    /// URLs seen more recently than this are not fetched again (hours)
    #[serde(rename = "recrawl-interval-hours")]
    pub recrawl_interval_hours: u64,

    /// Whether robots.txt rules are honored
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,

    /// Total timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Randomize the frontier before dispatch
    pub shuffle: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            parallelism: 3,
            politeness_delay_ms: 200,
            max_redirects: 10,
            recrawl_interval_hours: 7 * 24,
            respect_robots: true,
            request_timeout_secs: 30,
            shuffle: true,
        }
    }
}

impl CrawlerConfig {
    /// The recrawl interval as a chrono duration
    pub fn recrawl_interval(&self) -> chrono::Duration {
        chrono::Duration::hours(self.recrawl_interval_hours as i64)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Product token of the crawler, also used for robots.txt matching
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "tidepool".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version (+ContactURL; ContactEmail)`, with the
    /// parenthesised part reduced or dropped when contact details are missing.
    pub fn header_value(&self) -> String {
        let product = format!("{}/{}", self.crawler_name, self.crawler_version);
        match (&self.contact_url, &self.contact_email) {
            (Some(url), Some(email)) => format!("{} (+{}; {})", product, url, email),
            (Some(url), None) => format!("{} (+{})", product, url),
            (None, Some(email)) => format!("{} ({})", product, email),
            (None, None) => product,
        }
    }
}

/// External text converter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConvertersConfig {
    /// Program used to turn HTML into plain text
    #[serde(rename = "pandoc-path")]
    pub pandoc_path: String,

    /// Program used to turn PDF into plain text
    #[serde(rename = "pdftotext-path")]
    pub pdftotext_path: String,

    /// A converter still running after this long is killed (seconds)
    #[serde(rename = "converter-timeout-secs")]
    pub converter_timeout_secs: u64,
}

impl Default for ConvertersConfig {
    fn default() -> Self {
        Self {
            pandoc_path: "pandoc".to_string(),
            pdftotext_path: "pdftotext".to_string(),
            converter_timeout_secs: 60,
        }
    }
}

impl ConvertersConfig {
    pub fn converter_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.converter_timeout_secs)
    }
}

/// Index storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            database_path: "index.db".to_string(),
        }
    }
}

/// Search server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8000".to_string(),
        }
    }
}
