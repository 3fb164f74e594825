use std::path::PathBuf;

use crate::collector::CollectorConfig;
use crate::compiler::CompilerConfig;
use crate::crawler::CrawlerConfig;
use crate::discovery::{CallBudget, DiscoveryConfig};
use crate::extraction::ExtractionConfig;
use crate::http::FetchConfig;

/// Which classifier decides whether a title is administrative
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TitleFilterMode {
    /// Keyword tables only, no model calls
    Rules,
    /// Ask the model for every title that passes the shared gate
    #[default]
    Llm,
}

/// Configuration for an end-to-end run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Target state, by name or abbreviation
    pub state: String,

    /// Explicit counties to search; empty means load the state's unit list
    pub counties: Vec<String>,

    /// Explicit cities to search; takes precedence over counties
    pub cities: Vec<String>,

    /// Cap on places API calls; `None` is unlimited
    pub budget: Option<usize>,

    /// Organizations processed at once
    pub concurrency: usize,

    /// Title classifier
    pub title_filter: TitleFilterMode,

    /// Directory receiving every artifact
    pub output_dir: PathBuf,

    pub discovery: DiscoveryConfig,
    pub fetch: FetchConfig,
    pub crawler: CrawlerConfig,
    pub collector: CollectorConfig,
    pub extraction: ExtractionConfig,
    pub compiler: CompilerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            state: String::new(),
            counties: Vec::new(),
            cities: Vec::new(),
            budget: None,
            concurrency: 4,
            title_filter: TitleFilterMode::default(),
            output_dir: PathBuf::from("output"),
            discovery: DiscoveryConfig::default(),
            fetch: FetchConfig::default(),
            crawler: CrawlerConfig::default(),
            collector: CollectorConfig::default(),
            extraction: ExtractionConfig::default(),
            compiler: CompilerConfig::default(),
        }
    }
}

/// Builder for PipelineConfig
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.config.state = state.into();
        self
    }

    pub fn counties(mut self, counties: Vec<String>) -> Self {
        self.config.counties = counties;
        self
    }

    pub fn cities(mut self, cities: Vec<String>) -> Self {
        self.config.cities = cities;
        self
    }

    pub fn budget(mut self, budget: Option<usize>) -> Self {
        self.config.budget = budget;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn title_filter(mut self, mode: TitleFilterMode) -> Self {
        self.config.title_filter = mode;
        self
    }

    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = output_dir.into();
        self
    }

    pub fn discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.config.discovery = discovery;
        self
    }

    pub fn fetch(mut self, fetch: FetchConfig) -> Self {
        self.config.fetch = fetch;
        self
    }

    pub fn crawler(mut self, crawler: CrawlerConfig) -> Self {
        self.config.crawler = crawler;
        self
    }

    pub fn collector(mut self, collector: CollectorConfig) -> Self {
        self.config.collector = collector;
        self
    }

    pub fn extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.config.extraction = extraction;
        self
    }

    pub fn compiler(mut self, compiler: CompilerConfig) -> Self {
        self.config.compiler = compiler;
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// A fresh budget for one run
    pub fn call_budget(&self) -> CallBudget {
        CallBudget::with_limit(self.budget)
    }

    /// Query templates per county: the configured value, else 5 when the
    /// budget is unlimited and 2 when it is capped
    pub fn search_terms(&self) -> usize {
        self.discovery
            .max_search_terms
            .unwrap_or(if self.budget.is_none() { 5 } else { 2 })
    }

    /// Discovery settings with the search-term default applied
    pub fn effective_discovery(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            max_search_terms: Some(self.search_terms()),
            ..self.discovery.clone()
        }
    }
}
