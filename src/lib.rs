//! # SchoolScout - Contact Discovery for Private K-12 Schools
//!
//! This crate finds private and religious K-12 schools in a US state and
//! compiles the names, titles and emails of their administrators.
//!
//! ## Stages
//!
//! - Discovery: templated places searches per county or city, bounded by a
//!   shared call budget
//! - Filtering: drops churches, camps and out-of-state results
//! - Crawling: a priority frontier that visits staff-like pages first and
//!   prunes contact forms, calendars and social links
//! - Collection: a plain fetch, with a scripted browser fallback when the
//!   markup shows no email addresses
//! - Extraction: markup reduction, safe-boundary chunking and an LLM that
//!   returns contact records, followed by a keep/exclude title classifier
//! - Compilation: validation, confidence scoring, deduplication, CSV output
//!   and a quality report
//!
//! ## Example
//!
//! ```rust,no_run
//! use schoolscout::collector::ChromeBrowser;
//! use schoolscout::discovery::PlacesClient;
//! use schoolscout::http::HttpFetcher;
//! use schoolscout::model::{DEFAULT_OPENAI_MODEL, DEFAULT_REQUESTS_PER_MINUTE, openai_from_env};
//! use schoolscout::pipeline::{Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .state("Delaware")
//!         .budget(Some(100))
//!         .build();
//!
//!     let places = PlacesClient::from_env(&config.discovery)?;
//!     let fetcher = HttpFetcher::new(config.fetch.clone())?;
//!     let browser = ChromeBrowser::new(&config.collector, config.fetch.user_agent.clone());
//!     let model = openai_from_env(DEFAULT_OPENAI_MODEL, DEFAULT_REQUESTS_PER_MINUTE)?
//!         .completion()
//!         .clone();
//!
//!     let summary = Pipeline::new(config, fetcher, browser, model).run(places).await;
//!     println!("{}", serde_json::to_string_pretty(&summary)?);
//!     Ok(())
//! }
//! ```

mod error;
pub mod http;
pub mod model;
pub mod types;

pub mod collector;
pub mod compiler;
pub mod crawler;
pub mod discovery;
pub mod extraction;
pub mod filter;
pub mod pipeline;

pub use error::{Error, Result};

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::types::{CandidatePage, Contact, FetchMethod, Organization, PageContent};
}
