//! HTTP fetcher implementation
//!
//! This module defines the [`Fetcher`] boundary the engine depends on and an
//! implementation over `reqwest`:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Classifying responses into found / not found / other failure

use crate::config::{Config, UserAgentConfig};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Maximum redirect hops followed for a single fetch
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page body
    Ok(String),

    /// The page does not exist (HTTP 404); dropped silently
    NotFound,

    /// Any other failure, with the status code or reason
    OtherFailure(String),
}

/// Retrieves page bodies for the engine
///
/// Implementations classify failures themselves; the engine never retries.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Fetches a single absolute URL
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Timeout for a whole request
///
/// # Example
///
/// ```no_run
/// use market_harvest::config::UserAgentConfig;
/// use market_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher from the crawler configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
        let client = build_http_client(&config.user_agent, timeout)?;
        Ok(Self::from_client(client))
    }

    /// Wraps an existing client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// # Classification
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | HTTP 2xx with readable body | `Ok(body)` |
    /// | HTTP 404 | `NotFound` |
    /// | Any other status | `OtherFailure("HTTP <code>")` |
    /// | Timeout | `OtherFailure("Request timeout")` |
    /// | Connection error | `OtherFailure("Connection failed")` |
    /// | Redirect limit hit | `OtherFailure("Too many redirects")` |
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(&e),
        };

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return FetchOutcome::NotFound;
        }

        if !status.is_success() {
            return FetchOutcome::OtherFailure(format!("HTTP {}", status.as_u16()));
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Ok(body),
            Err(e) => FetchOutcome::OtherFailure(format!("Failed to read body: {}", e)),
        }
    }
}

/// Maps a transport error to a failure reason
fn classify_error(e: &reqwest::Error) -> FetchOutcome {
    let reason = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection failed".to_string()
    } else if e.is_redirect() {
        "Too many redirects".to_string()
    } else {
        e.to_string()
    };

    FetchOutcome::OtherFailure(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher() -> HttpFetcher {
        HttpFetcher::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
            .mount(&server)
            .await;

        let outcome = test_fetcher()
            .fetch(&format!("{}/page", server.uri()))
            .await;
        assert_eq!(outcome, FetchOutcome::Ok("<html>hello</html>".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = test_fetcher()
            .fetch(&format!("{}/missing", server.uri()))
            .await;
        assert_eq!(outcome, FetchOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_other_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let outcome = test_fetcher()
            .fetch(&format!("{}/busy", server.uri()))
            .await;
        assert_eq!(outcome, FetchOutcome::OtherFailure("HTTP 503".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_other_failure() {
        // Port 9 (discard) is almost never listening on loopback
        let outcome = test_fetcher().fetch("http://127.0.0.1:9/").await;
        assert!(matches!(outcome, FetchOutcome::OtherFailure(_)));
    }
}
