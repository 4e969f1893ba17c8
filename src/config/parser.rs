use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Missing sections and keys fall back to their defaults; the result is
/// validated before it is returned.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use market_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Seed: {}", config.crawler.seed_url);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex SHA-256 digest of configuration text
pub fn config_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Computes the SHA-256 hash of a configuration file
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    Ok(config_hash(&std::fs::read_to_string(path)?))
}

/// Loads a configuration and returns it with the hash of the exact text parsed
///
/// The file is read once, so the logged hash always matches the settings the
/// harvest runs with.
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, config_hash(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
seed-url = "https://market.example.com/"
concurrency = 4
poll-interval-ms = 50
request-timeout-secs = 10

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.concurrency, 4);
        assert_eq!(config.crawler.poll_interval_ms, 50);
        assert_eq!(config.crawler.seed_url, "https://market.example.com/");
        assert_eq!(config.user_agent.crawler_name, "TestCrawler");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let file = create_temp_config("[crawler]\nconcurrency = 3\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.concurrency, 3);
        assert_eq!(config.crawler.seed_url, crate::config::DEFAULT_SEED_URL);
        assert_eq!(
            config.crawler.poll_interval_ms,
            crate::config::DEFAULT_POLL_INTERVAL_MS
        );
        assert_eq!(config.user_agent.crawler_name, "MarketHarvest");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[crawler]\nconcurrency = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_load_with_hash_matches_file_hash() {
        let file = create_temp_config("[crawler]\nconcurrency = 7\n");

        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.crawler.concurrency, 7);
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
        assert_eq!(hash, config_hash("[crawler]\nconcurrency = 7\n"));
    }

    #[test]
    fn test_parse_config_from_text() {
        let config = parse_config("[crawler]\nseed-url = \"https://market.example.com/\"\n").unwrap();
        assert_eq!(config.crawler.effective_base_url(), "https://market.example.com/");
        assert!(matches!(
            parse_config("[crawler]\nseed-url = \"ftp://x/\"\n"),
            Err(ConfigError::Validation(_))
        ));
    }
}
