use std::path::PathBuf;
use std::time::Duration;

/// Default places API host
pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com";

/// Configuration for the discovery client
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Places API base URL
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Delay before requesting a follow-up results page, in milliseconds
    pub page_delay_ms: u64,

    /// Delay after each query and details call, in milliseconds
    pub query_delay_ms: u64,

    /// Use only the first N query templates per unit
    pub max_search_terms: Option<usize>,

    /// Search only the first N shuffled units; 0 means all
    pub batch_size: usize,

    /// Look up website and phone for results that lack them
    pub fetch_details: bool,

    /// Directory holding `states/<state>.txt` unit lists
    pub data_dir: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PLACES_BASE_URL.to_string(),
            timeout_secs: 60,
            page_delay_ms: 2000,
            query_delay_ms: 100,
            max_search_terms: None,
            batch_size: 0,
            fetch_details: true,
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Builder for DiscoveryConfig
#[derive(Debug, Default)]
pub struct DiscoveryConfigBuilder {
    config: DiscoveryConfig,
}

impl DiscoveryConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: DiscoveryConfig::default(),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    pub fn page_delay_ms(mut self, page_delay_ms: u64) -> Self {
        self.config.page_delay_ms = page_delay_ms;
        self
    }

    pub fn query_delay_ms(mut self, query_delay_ms: u64) -> Self {
        self.config.query_delay_ms = query_delay_ms;
        self
    }

    pub fn max_search_terms(mut self, max_search_terms: Option<usize>) -> Self {
        self.config.max_search_terms = max_search_terms;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn fetch_details(mut self, fetch_details: bool) -> Self {
        self.config.fetch_details = fetch_details;
        self
    }

    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = data_dir.into();
        self
    }

    pub fn build(self) -> DiscoveryConfig {
        self.config
    }
}

impl DiscoveryConfig {
    pub fn builder() -> DiscoveryConfigBuilder {
        DiscoveryConfigBuilder::new()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn query_delay(&self) -> Duration {
        Duration::from_millis(self.query_delay_ms)
    }
}
