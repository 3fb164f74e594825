use tracing::{debug, info, instrument, warn};

use crate::collector::browser::{ResilientBrowser, ScriptedBrowser};
use crate::collector::config::CollectorConfig;
use crate::collector::emails::extract_emails;
use crate::http::{FetchOutcome, PageFetcher};
use crate::types::{CandidatePage, FetchMethod, PageContent};

/// Two-tier page collector: a plain fetch first, then a scripted browser
/// when the plain markup shows no email addresses.
pub struct ContentCollector<F: PageFetcher, B: ScriptedBrowser> {
    fetcher: F,
    browser: Option<ResilientBrowser<B>>,
    config: CollectorConfig,
}

impl<F: PageFetcher, B: ScriptedBrowser> ContentCollector<F, B> {
    /// Collector that falls back to `browser` when `config.use_browser` is set
    pub fn new(fetcher: F, browser: B, config: CollectorConfig) -> Self {
        let browser = config.use_browser.then(|| ResilientBrowser::new(browser));
        Self {
            fetcher,
            browser,
            config,
        }
    }

    /// Collector that only ever uses the plain fetch
    pub fn without_browser(fetcher: F, config: CollectorConfig) -> Self {
        Self {
            fetcher,
            browser: None,
            config,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Browser restarts performed so far
    pub fn browser_restarts(&self) -> usize {
        self.browser.as_ref().map_or(0, ResilientBrowser::restarts)
    }

    /// Collect one page, or `None` when neither tier produced markup
    #[instrument(skip(self), level = "debug")]
    pub async fn collect_page(&self, organization: &str, url: &str) -> Option<PageContent> {
        let fast = match self.fetcher.fetch(url).await {
            FetchOutcome::Success(page) => Some(page.html),
            FetchOutcome::Retryable(reason) | FetchOutcome::Abandoned(reason) => {
                debug!(url, %reason, "fast fetch failed");
                None
            }
        };

        let content = |html: String, fetch_method| PageContent {
            url: url.to_string(),
            organization: organization.to_string(),
            email_count: extract_emails(&html).len(),
            html,
            fetch_method,
        };

        if let Some(html) = &fast {
            let found = extract_emails(html).len();
            if found > 0 || self.browser.is_none() {
                debug!(url, emails = found, "collected with fast fetch");
                return fast.map(|html| content(html, FetchMethod::FastHttp));
            }
        }

        let Some(browser) = &self.browser else {
            warn!(url, "page could not be fetched");
            return None;
        };

        match browser.render(url, &self.config.interaction_selectors).await {
            Ok(html) => {
                let page = content(html, FetchMethod::ScriptedBrowser);
                debug!(url, emails = page.email_count, "collected with scripted browser");
                Some(page)
            }
            Err(e) => {
                warn!(url, error = %e, "scripted browser failed");
                fast.map(|html| content(html, FetchMethod::FastHttp))
            }
        }
    }

    /// Collect each candidate page in turn with a polite delay between pages
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub async fn collect_pages(&self, pages: &[CandidatePage]) -> Vec<PageContent> {
        let mut collected = Vec::with_capacity(pages.len());

        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.page_delay()).await;
            }
            if let Some(content) = self.collect_page(&page.organization, &page.url).await {
                collected.push(content);
            }
        }

        info!(
            collected = collected.len(),
            with_emails = collected.iter().filter(|c| c.has_emails()).count(),
            "content collection finished"
        );
        collected
    }
}
