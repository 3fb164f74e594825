//! # Collector Module
//!
//! Obtains page markup so that contact emails are captured even when a site
//! only renders them client-side.
//!
//! A plain HTTP fetch runs first. When its markup shows no email addresses,
//! or the fetch is abandoned, the page is rendered in a scripted browser that
//! scrolls to, clicks and hovers staff-like elements before the markup is
//! read back. The method that produced the returned markup is recorded on
//! each [`PageContent`](crate::types::PageContent).

mod browser;
mod config;
mod content_collector;
mod emails;

pub use browser::{BrowserError, ChromeBrowser, ResilientBrowser, ScriptedBrowser};
pub use config::{CollectorConfig, CollectorConfigBuilder, INTERACTION_SELECTORS};
pub use content_collector::ContentCollector;
pub use emails::{EMAIL_PATTERN, extract_emails};
