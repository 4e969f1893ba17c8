//! Market-Harvest: a concurrent marketplace harvester
//!
//! This crate crawls a link graph rooted at a seed page, follows links found on
//! pages of interest, and streams out one structured record per unique entity
//! while the crawl keeps running in the background.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Market-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Worker task panicked: {0}")]
    WorkerPanic(String),

    #[error("Worker task was cancelled")]
    TaskCancelled,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Errors raised by a page extractor while classifying or extracting a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Missing element '{selector}' on {url}")]
    MissingElement { url: String, selector: String },

    #[error("Missing query parameter '{param}' on {url}")]
    MissingParam { url: String, param: String },

    #[error("Invalid value for '{field}' on {url}: {message}")]
    InvalidField {
        url: String,
        field: String,
        message: String,
    },

    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Result type alias for Market-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, EngineOptions, NextResult, PendingRecord};
pub use state::CrawlPhase;
pub use url::{normalize_url, resolve_link};
