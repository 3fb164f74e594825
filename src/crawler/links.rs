//! Link discovery and URL canonicalization

use std::collections::BTreeSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::crawler::error::CrawlError;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// File extensions that never lead to an HTML page
const SKIPPED_EXTENSIONS: [&str; 10] = [
    ".pdf", ".jpg", ".png", ".gif", ".jpeg", ".doc", ".docx", ".zip", ".mp4", ".mp3",
];

/// Admin and upload paths of common CMSes
const SKIPPED_PATHS: [&str; 3] = ["/wp-admin/", "/wp-login", "/wp-content/uploads/"];

/// Schemes that can appear in an href but are not pages
const SKIPPED_PREFIXES: [&str; 3] = ["javascript:", "mailto:", "tel:"];

/// Turn a homepage value into an absolute http(s) URL.
///
/// Values without a scheme, like `school.org`, are tried again as
/// `https://school.org`.
pub fn parse_homepage(raw: &str) -> Result<Url, CrawlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CrawlError::InvalidHomepage {
            url: raw.to_string(),
            reason: "empty".to_string(),
        });
    }

    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{raw}"))?,
        Err(e) => return Err(e.into()),
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CrawlError::InvalidHomepage {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(CrawlError::InvalidHomepage {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

/// Canonical identity of a page URL.
///
/// The query is dropped. The fragment survives only when it names a section
/// worth visiting on its own, so `/about#top` and `/about` are the same page
/// while `/about#leadership` is not.
pub fn canonicalize(url: &Url, preserved_fragments: &[String]) -> String {
    let mut canonical = url.clone();
    canonical.set_query(None);

    let keep_fragment = url.fragment().is_some_and(|fragment| {
        let fragment = fragment.to_lowercase();
        !fragment.is_empty()
            && preserved_fragments
                .iter()
                .any(|keyword| fragment.contains(keyword.as_str()))
    });
    if !keep_fragment {
        canonical.set_fragment(None);
    }

    canonical.to_string()
}

fn same_site(candidate: &Url, homepage: &Url) -> bool {
    candidate.host_str() == homepage.host_str()
        && candidate.port_or_known_default() == homepage.port_or_known_default()
}

fn is_skipped(canonical: &str, url: &Url) -> bool {
    let path = url.path().to_lowercase();
    let lowered = canonical.to_lowercase();
    SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext) || lowered.ends_with(ext))
        || SKIPPED_PATHS.iter().any(|p| lowered.contains(p))
}

/// Extract the canonical same-site links from a page.
///
/// # Arguments
///
/// * `html` - Markup of the fetched page
/// * `page_url` - URL the markup was fetched from; relative hrefs resolve against it
/// * `homepage` - Site homepage; only links on the same host and port are kept
/// * `preserved_fragments` - Fragment keywords that keep a fragment in the canonical URL
///
/// # Returns
///
/// The distinct canonical URLs in sorted order
pub fn extract_links(
    html: &str,
    page_url: &Url,
    homepage: &Url,
    preserved_fragments: &[String],
) -> BTreeSet<String> {
    let document = Html::parse_document(html);
    let mut links = BTreeSet::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        let lowered = href.to_lowercase();
        if href.is_empty() || SKIPPED_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
            continue;
        }

        let Ok(resolved) = page_url.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") || !same_site(&resolved, homepage) {
            continue;
        }

        let canonical = canonicalize(&resolved, preserved_fragments);
        if is_skipped(&canonical, &resolved) {
            continue;
        }
        links.insert(canonical);
    }

    links
}
