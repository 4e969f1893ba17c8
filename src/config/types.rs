use serde::Deserialize;

/// Seed page of the marketplace crawl
pub const DEFAULT_SEED_URL: &str = "https://market.android.com/";

/// Default number of concurrent fetch tasks
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default bounded wait inside the pull operation (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default per-request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for Market-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// The root URL the frontier is seeded with
    #[serde(rename = "seed-url", default = "default_seed_url")]
    pub seed_url: String,

    /// Fixed base used to resolve relative links (defaults to the seed's origin)
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,

    /// Maximum number of concurrently running fetch tasks
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Bounded wait between dispatch polls (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Timeout for a single HTTP request (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: default_seed_url(),
            base_url: None,
            concurrency: default_concurrency(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl CrawlerConfig {
    /// Returns the base URL for link resolution, falling back to the seed origin
    pub fn effective_base_url(&self) -> String {
        if let Some(base) = &self.base_url {
            return base.clone();
        }

        match ::url::Url::parse(&self.seed_url) {
            Ok(seed) => format!("{}/", seed.origin().ascii_serialization()),
            Err(_) => self.seed_url.clone(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "MarketHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/market-harvest".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

fn default_seed_url() -> String {
    DEFAULT_SEED_URL.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
