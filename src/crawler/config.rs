//! # Crawler Configuration Module
//!
//! Limits, caps and scoring rules for the priority-driven site crawler. The
//! defaults keep a crawl to a handful of fetches per site; every cap is a
//! field so it can be tuned per run.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: The main configuration struct with crawler parameters
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration

use std::time::Duration;

use crate::crawler::scoring::ScoringRules;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl
    pub max_depth: u32,

    /// Maximum number of pages fetched and recorded per site
    pub max_pages: usize,

    /// Stop once this many staff-like pages have been recorded
    pub max_staff_pages: usize,

    /// Highest-scoring new links enqueued from each page
    pub links_per_page: usize,

    /// Pages kept after the final sort
    pub max_results: usize,

    /// Rate limit in milliseconds between requests
    pub rate_limit_ms: u64,

    /// Fragment keywords that keep a fragment in a canonical URL
    pub preserved_fragments: Vec<String>,

    /// URL and content scoring table
    pub rules: ScoringRules,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 3,
            max_staff_pages: 3,
            links_per_page: 75,
            max_results: 3,
            rate_limit_ms: 500,
            preserved_fragments: [
                "team",
                "staff",
                "faculty",
                "leadership",
                "directory",
                "contact",
                "about",
                "administrat",
                "office",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
            rules: ScoringRules::default(),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the maximum depth to crawl
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Set the maximum number of pages to crawl
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    pub fn max_staff_pages(mut self, max_staff_pages: usize) -> Self {
        self.config.max_staff_pages = max_staff_pages;
        self
    }

    pub fn links_per_page(mut self, links_per_page: usize) -> Self {
        self.config.links_per_page = links_per_page;
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.config.max_results = max_results;
        self
    }

    /// Set the rate limit in milliseconds between requests
    pub fn rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.config.rate_limit_ms = rate_limit_ms;
        self
    }

    pub fn preserved_fragments(mut self, preserved_fragments: Vec<String>) -> Self {
        self.config.preserved_fragments = preserved_fragments;
        self
    }

    /// Replace the scoring table
    pub fn rules(mut self, rules: ScoringRules) -> Self {
        self.config.rules = rules;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the rate limit as a Duration
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}
