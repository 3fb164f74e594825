//! # Mock Page Fetcher for Testing
//!
//! Serves canned pages from a map and records every requested URL. Unknown
//! URLs are abandoned the way a 404 would be. Clones share both the pages and
//! the request log.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{FetchOutcome, FetchedPage, PageFetcher};

#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    pages: Arc<HashMap<String, String>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    /// Serve each `(url, html)` pair
    pub fn new<I, U, H>(pages: I) -> Self
    where
        I: IntoIterator<Item = (U, H)>,
        U: Into<String>,
        H: Into<String>,
    {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(url, html)| (url.into(), html.into()))
                    .collect(),
            ),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every URL requested so far, in order
    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.requests.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(html) => FetchOutcome::Success(FetchedPage {
                url: url.to_string(),
                status: 200,
                html: html.clone(),
            }),
            None => FetchOutcome::Abandoned("HTTP 404 Not Found".to_string()),
        }
    }
}
