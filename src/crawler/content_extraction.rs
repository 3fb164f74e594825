//! Content signals read from fetched markup

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::crawler::error::CrawlError;

/// Capitalized two-word sequences, a cheap proxy for personal names
pub static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][a-z]+\s[A-Z][a-z]+").expect("valid name regex"));

/// Elements whose text never reaches the reader
const INVISIBLE_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// What the crawler learns from a fetched page before scoring it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSignals {
    /// Trimmed contents of `<title>`
    pub title: Option<String>,

    /// Number of `a[href^="mailto:"]` links
    pub mailto_count: usize,

    /// Number of name-like matches in the visible text
    pub name_matches: usize,

    /// Lowercased text of all h1-h3 headings, space separated
    pub heading_text: String,
}

fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css)
        .map_err(|e| CrawlError::HtmlParse(format!("Failed to parse selector '{}': {}", css, e)))
}

/// Text of every text node outside script/style blocks, space separated
pub fn visible_text(document: &Html) -> String {
    let mut text = String::new();
    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name().to_string()))
            .is_some_and(|name| INVISIBLE_ELEMENTS.contains(&name.as_str()));
        if hidden {
            continue;
        }
        let fragment = fragment.trim();
        if !fragment.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(fragment);
        }
    }
    text
}

/// Extract the page title
///
/// # Arguments
///
/// * `document` - The parsed page
///
/// # Returns
///
/// The trimmed title, or `None` when missing or blank
pub fn extract_title(document: &Html) -> Result<Option<String>, CrawlError> {
    let title_selector = selector("title")?;
    Ok(document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty()))
}

/// Extract the scoring signals from a page
///
/// # Arguments
///
/// * `html` - The raw markup of the page
///
/// # Returns
///
/// The title, mailto count, name-pattern count and heading text
pub fn extract_page_signals(html: &str) -> Result<PageSignals, CrawlError> {
    let document = Html::parse_document(html);

    let title = extract_title(&document)?;

    let mailto_selector = selector(r#"a[href^="mailto:"]"#)?;
    let mailto_count = document.select(&mailto_selector).count();

    let text = visible_text(&document);
    let name_matches = NAME_PATTERN.find_iter(&text).count();

    let heading_selector = selector("h1, h2, h3")?;
    let heading_text = document
        .select(&heading_selector)
        .map(|h| h.text().collect::<Vec<_>>().join(" ").to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(PageSignals {
        title,
        mailto_count,
        name_matches,
        heading_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_page_signals() {
        let html = r#"
            <html><head><title> our staff </title>
            <script>var x = "Hidden Name";</script></head>
            <body>
              <h2>Administration:</h2>
              <p>Mary Jones, principal</p>
              <a href="mailto:mjones@school.org">email</a>
              <a href="MAILTO:other@school.org">upper</a>
              <a href="/about">about</a>
            </body></html>
        "#;

        let signals = extract_page_signals(html).unwrap();
        assert_eq!(signals.title.as_deref(), Some("our staff"));
        assert_eq!(signals.mailto_count, 1);
        assert_eq!(signals.name_matches, 1);
        assert!(signals.heading_text.contains("administration"));
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let document = Html::parse_document(
            "<html><body><p>Visible</p><style>.a{}</style><script>hidden()</script></body></html>",
        );
        assert_eq!(visible_text(&document), "Visible");
    }

    #[test]
    fn test_missing_title() {
        let document = Html::parse_document("<html><body>No title</body></html>");
        assert_eq!(extract_title(&document).unwrap(), None);
    }
}
