//! # Extraction Module
//!
//! Turns collected page markup into contact records with an LLM, then keeps
//! only administrative roles.
//!
//! ## Key Components
//!
//! - `reduce_html`: strips noise and keeps staff-like blocks
//! - `chunk_html`: splits reduced markup at safe closing tags
//! - `ContactExtractor`: sends each chunk to the model with bounded retries
//!   and parses the response with partial recovery
//! - `TitleClassifier`: keep/exclude decision per contact, either from a rule
//!   table or from the model
//!
//! A malformed or failed response is never fatal: it counts as zero contacts
//! for that chunk.

mod chunking;
mod config;
mod error;
mod extractor;
mod parse;
pub mod prompts;
mod reduce;
mod titles;

use std::collections::HashSet;

pub use chunking::{SAFE_BOUNDARIES, chunk_html};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::ExtractionError;
pub use extractor::ContactExtractor;
pub use parse::{RawContact, parse_response};
pub use reduce::{STAFF_KEYWORDS, reduce_html};
pub use titles::{
    EXCLUDED_FUNCTIONS, HARD_EXCLUSIONS, LlmTitleClassifier, MANAGERIAL, PRIMARY_LEADERSHIP,
    RuleTitleClassifier, TitleClassifier, TitleFilter, classify_title, gate, retry_hint,
};

use crate::types::Contact;

/// Drop repeated people within one page.
///
/// A contact is identified by its lowercased email, or by its lowercased
/// full name when it has no email. Contacts with neither are dropped. The
/// first occurrence wins.
pub fn dedup_page_contacts(contacts: Vec<Contact>) -> Vec<Contact> {
    let mut seen = HashSet::new();
    contacts
        .into_iter()
        .filter(|contact| {
            let key = match contact.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
                Some(email) => format!("email:{}", email.to_lowercase()),
                None => {
                    let name = contact.full_name().to_lowercase();
                    if name.is_empty() {
                        return false;
                    }
                    format!("name:{name}")
                }
            };
            seen.insert(key)
        })
        .collect()
}
