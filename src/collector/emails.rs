//! Email address detection in page markup

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::crawler::visible_text;

/// Loose email pattern used to decide whether a page shows addresses
pub static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").expect("valid email regex")
});

static HREF_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid href selector"));

static DATA_EMAIL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[data-email], [data-mailto]").expect("valid data attribute selector")
});

/// Distinct email addresses on a page.
///
/// Collected from the visible text, `mailto:` hrefs with any query removed,
/// and `data-email` / `data-mailto` attributes.
pub fn extract_emails(html: &str) -> BTreeSet<String> {
    let mut emails = BTreeSet::new();
    if html.trim().is_empty() {
        return emails;
    }

    let document = Html::parse_document(html);

    let text = visible_text(&document);
    emails.extend(EMAIL_PATTERN.find_iter(&text).map(|m| m.as_str().to_string()));

    for anchor in document.select(&HREF_SELECTOR) {
        let Some(address) = anchor
            .value()
            .attr("href")
            .and_then(|href| href.trim().strip_prefix("mailto:"))
        else {
            continue;
        };
        let address = address.split('?').next().unwrap_or_default().trim();
        if !address.is_empty() {
            emails.insert(address.to_string());
        }
    }

    for element in document.select(&DATA_EMAIL_SELECTOR) {
        for attribute in ["data-email", "data-mailto"] {
            if let Some(address) = element.value().attr(attribute).map(str::trim) {
                if !address.is_empty() {
                    emails.insert(address.to_string());
                }
            }
        }
    }

    emails
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_all_three_sources() {
        let html = r#"
            <html><body>
              <p>Principal: jane.doe@grace.org</p>
              <a href="mailto:office@grace.org?subject=Hello">Office</a>
              <span data-email="it@grace.org">IT</span>
              <span data-mailto="cfo@grace.org">Finance</span>
              <script>var hidden = "script@grace.org";</script>
              <p>again jane.doe@grace.org</p>
            </body></html>
        "#;

        let emails: Vec<String> = extract_emails(html).into_iter().collect();
        assert_eq!(
            emails,
            vec![
                "cfo@grace.org",
                "it@grace.org",
                "jane.doe@grace.org",
                "office@grace.org",
            ]
        );
    }

    #[test]
    fn test_no_emails() {
        assert!(extract_emails("<html><body><p>Call us</p></body></html>").is_empty());
        assert!(extract_emails("").is_empty());
    }
}
