//! HTTP page fetching for the crawler and the content collector
//!
//! Every fetch reports an explicit [`FetchOutcome`] instead of an error so
//! callers can tell "could not fetch" apart from "nothing found" without
//! matching on error identity. Transient failures (timeouts, connection
//! errors, 429 and 5xx responses) are retried with exponential backoff up to
//! a fixed attempt count; everything else abandons the URL immediately.

use std::time::Duration;

use reqwest::{Client as ReqwestClient, StatusCode, header::CONTENT_TYPE};
use tracing::{debug, instrument, warn};

use crate::error::Result;

#[cfg(test)]
pub mod mock_fetcher;

/// Default timeout for page requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Browser-like user agent; many school sites reject unknown agents
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Retry and timeout policy for page fetches
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Total attempts per URL, including the first
    pub max_attempts: u32,

    /// Base backoff in milliseconds; attempt `n` waits `base * 2^n`
    pub backoff_base_ms: u64,

    /// User agent to send
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: 5,
            backoff_base_ms: 1000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Builder for FetchConfig
#[derive(Debug, Default)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FetchConfig::default(),
        }
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts.max(1);
        self
    }

    pub fn backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.config.backoff_base_ms = backoff_base_ms;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> FetchConfig {
        self.config
    }
}

impl FetchConfig {
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::new()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay to wait after the zero-based `attempt` failed
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Response body
    pub html: String,
}

/// Result of fetching one URL
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The page was fetched
    Success(FetchedPage),

    /// A transient failure; trying again may succeed
    Retryable(String),

    /// The URL was given up on, either after the last retry or because the
    /// failure is not transient
    Abandoned(String),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    /// The fetched page, if any
    pub fn into_page(self) -> Option<FetchedPage> {
        match self {
            FetchOutcome::Success(page) => Some(page),
            _ => None,
        }
    }
}

/// Something that can fetch a page by URL.
///
/// Implementations must never fail with `Retryable` from `fetch`; the final
/// retry turns into `Abandoned`.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = FetchOutcome> + Send;
}

/// reqwest-backed [`PageFetcher`] with bounded retries
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given policy
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Make a single request and classify the result
    pub async fn fetch_once(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => return FetchOutcome::Abandoned(format!("bad request: {e}")),
            Err(e) => return FetchOutcome::Retryable(e.to_string()),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return FetchOutcome::Retryable(format!("HTTP {status}"));
        }
        if !status.is_success() {
            return FetchOutcome::Abandoned(format!("HTTP {status}"));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.is_empty() && !is_markup_content_type(&content_type) {
            return FetchOutcome::Abandoned(format!("not a markup page: {content_type}"));
        }

        match response.text().await {
            Ok(html) => FetchOutcome::Success(FetchedPage {
                url: url.to_string(),
                status: status.as_u16(),
                html,
            }),
            Err(e) => FetchOutcome::Retryable(format!("failed to read body: {e}")),
        }
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            match self.fetch_once(url).await {
                FetchOutcome::Retryable(reason) => {
                    debug!(attempt = attempt + 1, attempts, %reason, "transient fetch failure");
                    last_error = reason;
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.config.backoff_delay(attempt)).await;
                    }
                }
                outcome => return outcome,
            }
        }

        warn!(url, attempts, "giving up on URL: {}", last_error);
        FetchOutcome::Abandoned(format!("gave up after {attempts} attempts: {last_error}"))
    }
}

fn is_markup_content_type(content_type: &str) -> bool {
    content_type.starts_with("text/html")
        || content_type.starts_with("application/xhtml")
        || content_type.starts_with("text/plain")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn fast_fetcher(max_attempts: u32) -> HttpFetcher {
        let config = FetchConfig::builder()
            .timeout_secs(5)
            .max_attempts(max_attempts)
            .backoff_base_ms(0)
            .build();
        HttpFetcher::new(config).unwrap()
    }

    #[test]
    fn test_backoff_doubles() {
        let config = FetchConfig::default();
        assert_eq!(config.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(config.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/staff")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html><body>Staff</body></html>")
            .expect(1)
            .create_async()
            .await;

        let fetcher = fast_fetcher(3);
        let outcome = fetcher.fetch(&format!("{}/staff", server.url())).await;
        let page = outcome.into_page().unwrap();
        assert_eq!(page.status, 200);
        assert!(page.html.contains("Staff"));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_then_abandoned() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let fetcher = fast_fetcher(3);
        let outcome = fetcher.fetch(&format!("{}/flaky", server.url())).await;
        assert!(matches!(outcome, FetchOutcome::Abandoned(_)));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let fetcher = fast_fetcher(5);
        let outcome = fetcher.fetch(&format!("{}/missing", server.url())).await;
        assert!(matches!(outcome, FetchOutcome::Abandoned(_)));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_binary_content_is_abandoned() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/logo")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body("png")
            .create_async()
            .await;

        let fetcher = fast_fetcher(2);
        let outcome = fetcher.fetch(&format!("{}/logo", server.url())).await;
        assert!(matches!(outcome, FetchOutcome::Abandoned(_)));
    }
}
