//! Configuration module for Market-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every setting has a default, so a configuration file is optional.
//!
//! # Example
//!
//! ```no_run
//! use market_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawler will run {} concurrent fetches", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, UserAgentConfig, DEFAULT_CONCURRENCY, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SEED_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
