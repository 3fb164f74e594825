use std::time::Duration;

/// Elements clicked and hovered to reveal client-side emails
pub const INTERACTION_SELECTORS: [&str; 15] = [
    "img[alt*='staff']",
    "img[alt*='team']",
    "img[alt*='faculty']",
    "[class*='staff']",
    "[class*='team']",
    "[class*='faculty']",
    "[class*='member']",
    "[class*='profile']",
    "[class*='card']",
    "a[href*='staff']",
    "a[href*='team']",
    "a[href*='faculty']",
    "[data-email]",
    "[data-mailto]",
    "[class*='email']",
];

/// Configuration for content collection
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Fall back to the scripted browser when the fast fetch shows no emails
    pub use_browser: bool,

    /// CSS selectors of elements to interact with
    pub interaction_selectors: Vec<String>,

    /// Elements interacted with per selector
    pub interaction_limit: usize,

    /// Pause after each scroll or click, in milliseconds
    pub interaction_pause_ms: u64,

    /// Wait for scripts to settle after load and after interaction, in milliseconds
    pub settle_ms: u64,

    /// Browser page-load timeout in seconds
    pub page_load_timeout_secs: u64,

    /// Polite delay between pages, in milliseconds
    pub page_delay_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            use_browser: true,
            interaction_selectors: INTERACTION_SELECTORS.iter().map(|s| s.to_string()).collect(),
            interaction_limit: 10,
            interaction_pause_ms: 500,
            settle_ms: 2000,
            page_load_timeout_secs: 180,
            page_delay_ms: 500,
        }
    }
}

/// Builder for CollectorConfig
#[derive(Debug, Default)]
pub struct CollectorConfigBuilder {
    config: CollectorConfig,
}

impl CollectorConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CollectorConfig::default(),
        }
    }

    pub fn use_browser(mut self, use_browser: bool) -> Self {
        self.config.use_browser = use_browser;
        self
    }

    pub fn interaction_selectors(mut self, selectors: Vec<String>) -> Self {
        self.config.interaction_selectors = selectors;
        self
    }

    pub fn interaction_limit(mut self, interaction_limit: usize) -> Self {
        self.config.interaction_limit = interaction_limit;
        self
    }

    pub fn interaction_pause_ms(mut self, interaction_pause_ms: u64) -> Self {
        self.config.interaction_pause_ms = interaction_pause_ms;
        self
    }

    pub fn settle_ms(mut self, settle_ms: u64) -> Self {
        self.config.settle_ms = settle_ms;
        self
    }

    pub fn page_load_timeout_secs(mut self, page_load_timeout_secs: u64) -> Self {
        self.config.page_load_timeout_secs = page_load_timeout_secs;
        self
    }

    pub fn page_delay_ms(mut self, page_delay_ms: u64) -> Self {
        self.config.page_delay_ms = page_delay_ms;
        self
    }

    pub fn build(self) -> CollectorConfig {
        self.config
    }
}

impl CollectorConfig {
    pub fn builder() -> CollectorConfigBuilder {
        CollectorConfigBuilder::new()
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn interaction_pause(&self) -> Duration {
        Duration::from_millis(self.interaction_pause_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }
}
