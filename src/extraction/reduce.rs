//! Markup reduction before submission to the LLM
//!
//! Pages are mostly navigation, scripts and boilerplate. Reduction keeps the
//! blocks that plausibly hold staff listings so each request spends its
//! character budget on people.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::crawler::NAME_PATTERN;

/// Keywords that mark a block as staff-related
pub const STAFF_KEYWORDS: [&str; 12] = [
    "staff",
    "faculty",
    "directory",
    "administration",
    "administrator",
    "leadership",
    "our team",
    "principal",
    "head of school",
    "superintendent",
    "personnel",
    "director",
];

static DISCARDED: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script, style, noscript, template, iframe, svg, link, meta")
        .expect("valid discard selector")
});

static PERIPHERAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("header, footer, nav, aside").expect("valid peripheral selector"));

static CONTAINERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("main, section, article, div, table, ul, ol, header, footer, nav, aside")
        .expect("valid container selector")
});

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("valid body selector"));

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn text_len(element: ElementRef<'_>) -> usize {
    element.text().map(|t| t.trim().len()).sum()
}

/// Containers directly under `element`, looking through inline wrappers
fn nearest_containers(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut found = Vec::new();
    for child in element.children().filter_map(ElementRef::wrap) {
        if CONTAINERS.matches(&child) {
            found.push(child);
        } else {
            found.extend(nearest_containers(child));
        }
    }
    found
}

fn mentions_staff(text: &str) -> bool {
    let lower = text.to_lowercase();
    STAFF_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// A block worth sending: it talks about staff, or pairs an address with a name
fn qualifies(text: &str) -> bool {
    mentions_staff(text) || (text.contains('@') && NAME_PATTERN.is_match(text))
}

/// Push the blocks of `element` worth sending into `blocks`.
///
/// A qualifying container whose qualifying children hold less than half of
/// its text is a wrapper: its children are kept instead. Anything else that
/// qualifies is kept whole.
fn collect_blocks(element: ElementRef<'_>, blocks: &mut Vec<String>) {
    if !qualifies(&element_text(element)) {
        return;
    }

    let qualifying: Vec<_> = nearest_containers(element)
        .into_iter()
        .filter(|child| qualifies(&element_text(*child)))
        .collect();
    let covered: usize = qualifying.iter().map(|child| text_len(*child)).sum();
    if !qualifying.is_empty() && covered * 2 < text_len(element) {
        let before = blocks.len();
        for child in qualifying {
            collect_blocks(child, blocks);
        }
        if blocks.len() > before {
            return;
        }
    }
    blocks.push(element.html());
}

/// Strip noise from `html` and keep only blocks likely to list people.
///
/// Script, style and comment nodes are removed. Header, footer, nav and
/// aside blocks are removed unless they mention staff. Containers that
/// mention staff or pair an `@` with a name-like string are kept in document
/// order, descending through page wrappers so unrelated sections are left
/// out. When none qualifies the whole cleaned body is returned.
pub fn reduce_html(html: &str) -> String {
    let mut document = Html::parse_document(html);

    let mut noise: Vec<_> = document.select(&DISCARDED).map(|e| e.id()).collect();
    noise.extend(
        document
            .tree
            .root()
            .descendants()
            .filter(|node| node.value().is_comment())
            .map(|node| node.id()),
    );
    for id in noise {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let peripheral: Vec<_> = document
        .select(&PERIPHERAL)
        .filter(|e| !mentions_staff(&element_text(*e)))
        .map(|e| e.id())
        .collect();
    for id in peripheral {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());
    let mut blocks = Vec::new();
    for element in nearest_containers(root) {
        collect_blocks(element, &mut blocks);
    }

    if blocks.is_empty() {
        debug!("no qualifying block, sending the cleaned page");
        return document
            .select(&BODY)
            .next()
            .map(|body| body.inner_html())
            .unwrap_or_else(|| document.root_element().html());
    }

    let reduced = blocks.join("\n");
    debug!(original = html.len(), reduced = reduced.len(), blocks = blocks.len(), "reduced markup");
    reduced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_scripts_comments_and_navigation() {
        let html = r#"<html><head><style>.x{}</style></head><body>
            <nav><a href="/">Home</a><a href="/calendar">Calendar</a></nav>
            <!-- tracking -->
            <div class="people"><h2>Our Staff</h2><p>Jane Doe, Principal</p></div>
            <script>var email = "x@y.org";</script>
            <footer>Copyright 2024</footer>
        </body></html>"#;

        let reduced = reduce_html(html);
        assert!(reduced.contains("Jane Doe, Principal"));
        assert!(!reduced.contains("Calendar"));
        assert!(!reduced.contains("tracking"));
        assert!(!reduced.contains("var email"));
        assert!(!reduced.contains("Copyright"));
    }

    #[test]
    fn test_keeps_staff_navigation() {
        let html = r#"<body><aside><h3>Leadership</h3><p>John Roe, Head of School</p></aside>
            <div>Lunch menu</div></body>"#;

        let reduced = reduce_html(html);
        assert!(reduced.contains("John Roe"));
        assert!(!reduced.contains("Lunch menu"));
    }

    #[test]
    fn test_keeps_blocks_pairing_addresses_with_names() {
        let html = r#"<body>
            <section><p>Tuition and fees</p></section>
            <section><p>Mary Smith mary@school.org</p></section>
        </body>"#;

        let reduced = reduce_html(html);
        assert!(reduced.contains("mary@school.org"));
        assert!(!reduced.contains("Tuition"));
    }

    #[test]
    fn test_nested_block_only_once() {
        let html = r#"<body><section id="outer"><h2>Faculty</h2>
            <div id="inner">Faculty member Anna Lee</div></section></body>"#;

        let reduced = reduce_html(html);
        assert_eq!(reduced.matches("Anna Lee").count(), 1);
    }

    #[test]
    fn test_descends_through_page_wrapper() {
        let filler = "<p>Lunch menu: pizza, salad and fruit cup.</p>".repeat(200);
        let html = format!(
            r#"<body><div id="wrapper">{filler}
            <div class="staff"><h2>Administration</h2><p>Jane Doe, Principal, jdoe@grace.org</p></div>
            </div></body>"#
        );

        let reduced = reduce_html(&html);
        assert!(reduced.contains("Jane Doe, Principal"));
        assert!(!reduced.contains("Lunch menu"));
        assert!(reduced.len() < html.len() / 10);
    }

    #[test]
    fn test_keeps_block_whose_children_are_mostly_staff() {
        let html = r#"<body><section><h2>Leadership</h2>
            <div>Jane Doe, Principal</div>
            <div>John Roe, Director of Studies</div>
            <div>Ann Lee</div></section></body>"#;

        let reduced = reduce_html(html);
        assert!(reduced.contains("Ann Lee"));
        assert!(reduced.contains("<h2>Leadership</h2>"));
    }

    #[test]
    fn test_wrapper_kept_when_children_carry_no_keyword() {
        let html = r#"<body><div><h2>Our Staff</h2>
            <div>Ann Lee</div><div>Lunch menu and bus routes for the fall term</div></div></body>"#;

        let reduced = reduce_html(html);
        assert!(reduced.contains("Our Staff"));
        assert!(reduced.contains("Ann Lee"));
    }

    #[test]
    fn test_falls_back_to_cleaned_page() {
        let html = "<body><p>Welcome to Grace</p><script>track()</script></body>";
        let reduced = reduce_html(html);
        assert!(reduced.contains("Welcome to Grace"));
        assert!(!reduced.contains("track()"));
    }
}
