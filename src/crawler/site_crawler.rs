//! Priority-first, budget-bounded crawl of a single site

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::crawler::config::CrawlerConfig;
use crate::crawler::content_extraction::{PageSignals, extract_page_signals};
use crate::crawler::error::CrawlError;
use crate::crawler::frontier::Frontier;
use crate::crawler::links::{extract_links, parse_homepage};
use crate::http::{FetchOutcome, PageFetcher};
use crate::types::{CandidatePage, Organization};

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Nothing left to visit
    #[default]
    FrontierExhausted,
    /// `max_pages` pages were recorded
    PageCapReached,
    /// `max_staff_pages` staff-like pages were recorded
    StaffCapReached,
    /// The organization has no website
    NoWebsite,
    /// The website value is not a usable URL
    InvalidHomepage,
}

/// Outcome of crawling one site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlReport {
    /// Ranked result pages, all with a positive score
    pub pages: Vec<CandidatePage>,

    /// Pages fetched successfully
    pub fetched: usize,

    /// URLs given up on after their fetch failed
    pub abandoned: usize,

    /// Frontier entries skipped for a non-positive score
    pub pruned: usize,

    pub staff_pages_found: usize,

    pub stop_reason: StopReason,

    /// Every URL a fetch was attempted for, in order
    pub fetched_urls: Vec<String>,
}

impl CrawlReport {
    fn stopped(reason: StopReason) -> Self {
        Self {
            stop_reason: reason,
            ..Default::default()
        }
    }
}

/// Crawls one site at a time with a [`PageFetcher`]
#[derive(Debug, Clone)]
pub struct SiteCrawler<F: PageFetcher> {
    fetcher: F,
    config: CrawlerConfig,
}

impl<F: PageFetcher> SiteCrawler<F> {
    pub fn new(fetcher: F, config: CrawlerConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawl an organization's website.
    ///
    /// An organization without a usable website yields an empty report.
    pub async fn crawl_organization(&self, organization: &Organization) -> CrawlReport {
        let Some(website) = organization.website_url() else {
            debug!(organization = %organization.name, "no website, skipping crawl");
            return CrawlReport::stopped(StopReason::NoWebsite);
        };

        match self.crawl(&organization.name, website).await {
            Ok(report) => report,
            Err(e) => {
                warn!(organization = %organization.name, "skipping crawl: {}", e);
                CrawlReport::stopped(StopReason::InvalidHomepage)
            }
        }
    }

    /// Crawl a site starting from its homepage.
    ///
    /// # Arguments
    ///
    /// * `organization` - Name recorded on every result page
    /// * `homepage` - Homepage URL; a missing scheme defaults to https
    ///
    /// # Returns
    ///
    /// The report with at most `max_results` pages ranked by score. Fetch
    /// failures never fail the crawl; only an unusable homepage does.
    #[instrument(skip(self), fields(homepage = %homepage))]
    pub async fn crawl(&self, organization: &str, homepage: &str) -> Result<CrawlReport, CrawlError> {
        let homepage = parse_homepage(homepage)?;
        let config = &self.config;
        let rules = &config.rules;

        let mut frontier = Frontier::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut results: Vec<CandidatePage> = Vec::new();
        let mut report = CrawlReport::default();

        frontier.push(homepage.to_string(), 0, 0);

        let stop_reason = loop {
            if results.len() >= config.max_pages {
                break StopReason::PageCapReached;
            }
            if report.staff_pages_found >= config.max_staff_pages {
                break StopReason::StaffCapReached;
            }
            let Some(entry) = frontier.pop() else {
                break StopReason::FrontierExhausted;
            };

            if visited.contains(&entry.url) || entry.depth > config.max_depth {
                continue;
            }
            // Pruned entries stay out of `visited`; a later positive-score
            // copy of the same URL may still be fetched.
            if entry.score <= 0 && entry.depth > 0 {
                debug!(url = %entry.url, score = entry.score, "pruning low-priority URL");
                report.pruned += 1;
                continue;
            }

            visited.insert(entry.url.clone());
            report.fetched_urls.push(entry.url.clone());

            let page = match self.fetcher.fetch(&entry.url).await {
                FetchOutcome::Success(page) => page,
                FetchOutcome::Retryable(reason) | FetchOutcome::Abandoned(reason) => {
                    warn!(url = %entry.url, "abandoning URL: {}", reason);
                    report.abandoned += 1;
                    continue;
                }
            };
            report.fetched += 1;

            let signals = extract_page_signals(&page.html).unwrap_or_else(|e| {
                warn!(url = %entry.url, "could not read page signals: {}", e);
                PageSignals::default()
            });
            let score = rules.score_url(&entry.url) + rules.score_content(&signals);
            debug!(url = %entry.url, depth = entry.depth, score, "scored page");

            if rules.is_staff_like(&entry.url) {
                report.staff_pages_found += 1;
            }

            results.push(CandidatePage {
                url: entry.url.clone(),
                organization: organization.to_string(),
                depth: entry.depth,
                score,
                title: signals.title,
            });

            if report.staff_pages_found >= config.max_staff_pages {
                break StopReason::StaffCapReached;
            }

            if entry.depth < config.max_depth && results.len() < config.max_pages {
                let page_url = Url::parse(&entry.url).unwrap_or_else(|_| homepage.clone());
                let links = extract_links(
                    &page.html,
                    &page_url,
                    &homepage,
                    &config.preserved_fragments,
                );

                let mut scored: Vec<(String, i32)> = links
                    .into_iter()
                    .filter(|link| !visited.contains(link))
                    .map(|link| {
                        let score = rules.score_url(&link);
                        (link, score)
                    })
                    .collect();
                scored.sort_by(|a, b| b.1.cmp(&a.1));

                for (link, link_score) in scored.into_iter().take(config.links_per_page) {
                    frontier.push(link, entry.depth + 1, link_score);
                }
            }

            tokio::time::sleep(config.rate_limit()).await;
        };

        results.sort_by(|a, b| b.score.cmp(&a.score));
        results.retain(|page| page.score > 0);
        results.truncate(config.max_results);

        info!(
            pages = results.len(),
            fetched = report.fetched,
            abandoned = report.abandoned,
            ?stop_reason,
            "crawl finished"
        );

        report.pages = results;
        report.stop_reason = stop_reason;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::config::CrawlerConfigBuilder;
    use crate::http::mock_fetcher::MockFetcher;
    use crate::http::{FetchConfig, HttpFetcher};

    const SITE: &str = "https://school.org";

    /// Serve each `(path, html)` pair under `SITE`
    fn site(pages: &[(&str, String)]) -> MockFetcher {
        MockFetcher::new(pages.iter().map(|(path, html)| (url(path), html.clone())))
    }

    fn page_with_links(links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|l| format!(r#"<a href="{l}">link</a>"#))
            .collect();
        format!("<html><head><title>page</title></head><body>{anchors}</body></html>")
    }

    fn url(path: &str) -> String {
        format!("{SITE}{path}")
    }

    fn config() -> CrawlerConfigBuilder {
        CrawlerConfig::builder().rate_limit_ms(0)
    }

    #[tokio::test]
    async fn test_staff_link_visited_before_penalized_link() {
        let fetcher = site(&[
            ("/", page_with_links(&["/staff", "/facebook.com/page"])),
            ("/staff", page_with_links(&[])),
            ("/facebook.com/page", page_with_links(&[])),
        ]);
        let crawler = SiteCrawler::new(fetcher.clone(), config().build());

        let report = crawler.crawl("Example School", SITE).await.unwrap();

        assert_eq!(fetcher.requested(), vec![url("/"), url("/staff")]);
        assert!(report.pages.iter().all(|p| !p.url.contains("facebook.com")));
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.pages[0].url, url("/staff"));
        assert_eq!(report.pages[0].organization, "Example School");
        assert_eq!(report.pages[0].depth, 1);
        assert_eq!(report.pruned, 1);
        assert_eq!(report.stop_reason, StopReason::FrontierExhausted);
    }

    #[tokio::test]
    async fn test_forced_zero_pages_pruned_but_homepage_fetched() {
        let fetcher = site(&[
            ("/contact-us", page_with_links(&["/contact", "/admissions", "/about"])),
            ("/about", page_with_links(&[])),
        ]);
        let crawler = SiteCrawler::new(fetcher.clone(), config().build());

        let report = crawler
            .crawl("Example School", &url("/contact-us"))
            .await
            .unwrap();

        let requested = fetcher.requested();
        assert_eq!(requested, vec![url("/contact-us"), url("/about")]);
        assert!(report.pages.iter().all(|p| !p.url.contains("contact")));
        assert_eq!(report.pruned, 2);
    }

    #[tokio::test]
    async fn test_page_cap_bounds_fetches_and_results() {
        let links = [
            "/faculty", "/about", "/mission", "/history", "/board", "/principal", "/vision",
        ];
        let mut pages = vec![("/", page_with_links(&links))];
        for link in links {
            pages.push((link, page_with_links(&[])));
        }
        let fetcher = site(&pages);
        let crawler = SiteCrawler::new(fetcher.clone(), config().max_pages(3).max_results(5).build());

        let report = crawler.crawl("Example School", SITE).await.unwrap();

        assert_eq!(fetcher.requested().len(), 3);
        assert!(report.pages.len() <= 3);
        assert_eq!(report.stop_reason, StopReason::PageCapReached);
        // the two best-scoring links were fetched after the homepage
        assert_eq!(fetcher.requested()[1], url("/board"));
    }

    #[tokio::test]
    async fn test_staff_cap_stops_crawl() {
        let fetcher = site(&[
            ("/", page_with_links(&["/staff", "/faculty", "/team"])),
            ("/staff", page_with_links(&[])),
            ("/faculty", page_with_links(&[])),
            ("/team", page_with_links(&[])),
        ]);
        let crawler = SiteCrawler::new(
            fetcher.clone(),
            config().max_pages(10).max_staff_pages(2).build(),
        );

        let report = crawler.crawl("Example School", SITE).await.unwrap();

        assert_eq!(report.staff_pages_found, 2);
        assert_eq!(report.stop_reason, StopReason::StaffCapReached);
        assert_eq!(fetcher.requested().len(), 3);
    }

    fn staff_chain() -> MockFetcher {
        site(&[
            ("/", page_with_links(&["/a-staff"])),
            ("/a-staff", page_with_links(&["/b-staff"])),
            ("/b-staff", page_with_links(&["/c-staff"])),
            ("/c-staff", page_with_links(&[])),
        ])
    }

    #[tokio::test]
    async fn test_depth_limit_stops_following_links() {
        let fetcher = staff_chain();
        let crawler = SiteCrawler::new(
            fetcher.clone(),
            config().max_depth(1).max_pages(10).max_staff_pages(10).build(),
        );

        let report = crawler.crawl("Example School", SITE).await.unwrap();

        assert_eq!(fetcher.requested(), vec![url("/"), url("/a-staff")]);
        assert!(report.pages.iter().all(|p| p.depth <= 1));
        assert_eq!(report.stop_reason, StopReason::FrontierExhausted);

        let fetcher = staff_chain();
        let crawler = SiteCrawler::new(
            fetcher.clone(),
            config().max_depth(2).max_pages(10).max_staff_pages(10).build(),
        );
        crawler.crawl("Example School", SITE).await.unwrap();
        assert_eq!(
            fetcher.requested(),
            vec![url("/"), url("/a-staff"), url("/b-staff")]
        );
    }

    #[tokio::test]
    async fn test_only_best_links_per_page_enter_frontier() {
        let fetcher = site(&[
            (
                "/",
                page_with_links(&["/about", "/faculty", "/leadership-team", "/staff-directory"]),
            ),
            ("/about", page_with_links(&[])),
            ("/faculty", page_with_links(&[])),
            ("/leadership-team", page_with_links(&[])),
            ("/staff-directory", page_with_links(&[])),
        ]);
        let crawler = SiteCrawler::new(
            fetcher.clone(),
            config().links_per_page(2).max_pages(10).max_staff_pages(10).build(),
        );

        let report = crawler.crawl("Example School", SITE).await.unwrap();

        let requested: HashSet<String> = fetcher.requested().into_iter().collect();
        let expected: HashSet<String> = [url("/"), url("/leadership-team"), url("/staff-directory")]
            .into_iter()
            .collect();
        assert_eq!(requested, expected);
        assert_eq!(fetcher.requested().len(), 3);
        assert_eq!(report.stop_reason, StopReason::FrontierExhausted);
    }

    #[tokio::test]
    async fn test_cyclic_site_terminates_with_each_url_fetched_once() {
        let fetcher = site(&[
            ("/", page_with_links(&["/about", "/staff-list"])),
            ("/about", page_with_links(&["/", "/staff-list", "/about#history"])),
            ("/staff-list", page_with_links(&["/", "/about", "/staff-list"])),
        ]);
        let crawler = SiteCrawler::new(
            fetcher.clone(),
            config().max_pages(100).max_staff_pages(100).build(),
        );

        let report = crawler.crawl("Example School", SITE).await.unwrap();

        let requested = fetcher.requested();
        let distinct: HashSet<&String> = requested.iter().collect();
        assert_eq!(requested.len(), distinct.len());
        assert_eq!(report.stop_reason, StopReason::FrontierExhausted);
        assert_eq!(report.fetched, 3);
    }

    #[tokio::test]
    async fn test_abandoned_fetch_does_not_abort_crawl() {
        let fetcher = site(&[
            ("/", page_with_links(&["/staff", "/about"])),
            ("/about", page_with_links(&[])),
        ]);
        let crawler = SiteCrawler::new(fetcher.clone(), config().build());

        let report = crawler.crawl("Example School", SITE).await.unwrap();

        assert_eq!(report.abandoned, 1);
        assert_eq!(report.fetched, 2);
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.pages[0].url, url("/about"));
    }

    #[tokio::test]
    async fn test_organization_without_website_yields_nothing() {
        let fetcher = site(&[]);
        let crawler = SiteCrawler::new(fetcher.clone(), config().build());
        let organization = Organization {
            place_id: "p1".to_string(),
            name: "No Site Academy".to_string(),
            website: Some("   ".to_string()),
            ..Default::default()
        };

        let report = crawler.crawl_organization(&organization).await;

        assert!(report.pages.is_empty());
        assert_eq!(report.stop_reason, StopReason::NoWebsite);
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_crawl_over_http_skips_contact_page() {
        let mut server = mockito::Server::new_async().await;
        let home = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(page_with_links(&["/staff", "/contact-us"]))
            .expect(1)
            .create_async()
            .await;
        let staff = server
            .mock("GET", "/staff")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(
                r#"<html><body><h2>Our Staff</h2>
                   <a href="mailto:a@school.org">a</a><a href="mailto:b@school.org">b</a>
                   </body></html>"#,
            )
            .expect(1)
            .create_async()
            .await;
        let contact = server
            .mock("GET", "/contact-us")
            .expect(0)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(
            FetchConfig::builder()
                .timeout_secs(5)
                .max_attempts(1)
                .backoff_base_ms(0)
                .build(),
        )
        .unwrap();
        let crawler = SiteCrawler::new(fetcher, config().build());

        let report = crawler.crawl("Example School", &server.url()).await.unwrap();

        assert_eq!(report.pages.len(), 1);
        // 25 for the URL, 25 for two mailto links, 10 for the heading
        assert_eq!(report.pages[0].score, 60);

        home.assert_async().await;
        staff.assert_async().await;
        contact.assert_async().await;
    }
}
