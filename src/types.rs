//! Records passed between pipeline stages.
//!
//! Each stage consumes the previous stage's records: discovery produces
//! [`Organization`]s, the crawler produces [`CandidatePage`]s, the collector
//! produces [`PageContent`], and extraction produces [`Contact`]s which the
//! compiler scores and deduplicates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A school found through the places search.
///
/// Created once per unique place identifier and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique place identifier, the deduplication key
    pub place_id: String,

    /// Display name
    pub name: String,

    /// Formatted postal address
    pub address: String,

    /// Website URL, if listed
    pub website: Option<String>,

    /// Phone number, if listed
    pub phone: Option<String>,

    /// Average rating
    pub rating: Option<f64>,

    /// Number of ratings
    pub user_ratings_total: Option<u32>,

    /// Raw category tags
    pub types: Vec<String>,

    /// Business status reported by the places API
    pub business_status: Option<String>,

    /// County the record is attributed to
    pub county: String,

    /// Target state name
    pub state: String,

    /// State read from the address components
    pub detected_state: String,

    /// County read from the address components
    pub detected_county: String,

    /// Query prefix that found this record, e.g. "Catholic schools"
    pub found_via: String,
}

impl Organization {
    /// Website URL when it is present and non-blank
    pub fn website_url(&self) -> Option<&str> {
        self.website
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }
}

/// A page discovered while crawling an organization's site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePage {
    /// Canonical absolute URL, unique within one crawl
    pub url: String,

    /// Name of the owning organization
    pub organization: String,

    /// Crawl depth at which the page was fetched
    pub depth: u32,

    /// Post-fetch priority score
    pub score: i32,

    /// Page title, if the markup had one
    pub title: Option<String>,
}

/// How a page's markup was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMethod {
    /// Plain HTTP GET
    FastHttp,
    /// Rendered and interacted with in a scripted browser
    ScriptedBrowser,
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMethod::FastHttp => write!(f, "fast-http"),
            FetchMethod::ScriptedBrowser => write!(f, "scripted-browser"),
        }
    }
}

/// Raw markup collected for one candidate page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// Page URL
    pub url: String,

    /// Name of the owning organization
    pub organization: String,

    /// Raw markup
    pub html: String,

    /// Method that produced `html`
    pub fetch_method: FetchMethod,

    /// Number of distinct email addresses detected in `html`
    pub email_count: usize,
}

impl PageContent {
    pub fn has_emails(&self) -> bool {
        self.email_count > 0
    }
}

/// A person extracted from a page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub email: Option<String>,
    pub phone: Option<String>,

    /// Name of the owning organization
    pub organization: String,

    /// Page the contact was extracted from
    pub source_url: String,

    /// Completeness-derived confidence, 0 to 100. Zero until compiled.
    #[serde(default)]
    pub confidence: u8,
}

impl Contact {
    /// First and last name joined by a space
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_helpers() {
        let contact = Contact {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: Some("  ".to_string()),
            ..Default::default()
        };

        assert_eq!(contact.full_name(), "Jane Doe");
        assert!(!contact.has_email());
        assert!(!contact.has_phone());
    }

    #[test]
    fn test_fetch_method_serialization() {
        let json = serde_json::to_string(&FetchMethod::ScriptedBrowser).unwrap();
        assert_eq!(json, "\"scripted-browser\"");
        assert_eq!(FetchMethod::FastHttp.to_string(), "fast-http");
    }
}
