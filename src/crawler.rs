//! # Site Crawler Module
//!
//! Finds the few pages of a school website most likely to list staff and
//! leadership contacts, without crawling the whole site.
//!
//! ## Key Components
//!
//! - `SiteCrawler`: Priority-first crawl of one site over any `PageFetcher`
//! - `CrawlerConfig`: Depth, page and staff-page caps plus the scoring table
//! - `ScoringRules`: Declarative URL and content scoring
//! - `CrawlReport`: Ranked pages plus counters and the reason the crawl stopped
//!
//! ## Features
//!
//! - Max-priority frontier ordered by score, then depth, then URL
//! - Zero-priority pages are pruned before they cost a fetch; the homepage is
//!   always fetched
//! - Early termination on the page cap, the staff-page cap, or an empty frontier
//! - Same-site link canonicalization that keeps staff-related fragments
//! - Fetch failures abandon a single URL, never the crawl

mod config;
mod content_extraction;
mod error;
mod frontier;
mod links;
mod scoring;
mod site_crawler;

pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use content_extraction::{NAME_PATTERN, PageSignals, extract_page_signals, visible_text};
pub use error::CrawlError;
pub use frontier::{Frontier, FrontierEntry};
pub use links::{canonicalize, extract_links, parse_homepage};
pub use scoring::{KeywordFamily, ScoringRules, Tier};
pub use site_crawler::{CrawlReport, SiteCrawler, StopReason};
