//! Declarative scoring rules for candidate pages.
//!
//! A URL is scored before it is fetched from its text alone; once fetched, a
//! content score derived from [`PageSignals`] is added on top. All weights
//! live in [`ScoringRules`] so they can be tuned without touching the crawl
//! loop.

use url::Url;

use crate::crawler::content_extraction::PageSignals;

/// A set of keywords sharing one score delta
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordFamily {
    pub keywords: Vec<String>,
    pub delta: i32,
}

impl KeywordFamily {
    pub fn new(keywords: &[&str], delta: i32) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            delta,
        }
    }

    /// Number of keywords found in `haystack`
    pub fn count_matches(&self, haystack: &str) -> usize {
        self.keywords
            .iter()
            .filter(|k| haystack.contains(k.as_str()))
            .count()
    }

    pub fn any_match(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }
}

/// Bonus applied when a count reaches `min_count`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub min_count: usize,
    pub bonus: i32,
}

/// Page scoring rule table
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringRules {
    /// Any of these in the URL forces a score of exactly zero
    pub forced_zero: Vec<String>,

    /// Each matched keyword adds its family's delta
    pub url_families: Vec<KeywordFamily>,

    /// Applied once when the host contains any keyword
    pub bad_hosts: KeywordFamily,

    /// Applied once when the fragment contains any keyword
    pub fragment: KeywordFamily,

    /// URL keywords that mark a page as staff-like
    pub staff_like: Vec<String>,

    /// Applied once when any h1-h3 heading contains any keyword
    pub heading: KeywordFamily,

    /// Highest matching tier wins; listed in descending `min_count`
    pub mailto_tiers: Vec<Tier>,

    /// Highest matching tier wins; listed in descending `min_count`
    pub name_tiers: Vec<Tier>,
}

const HIGH_VALUE: [&str; 14] = [
    "staff",
    "faculty",
    "directory",
    "administration",
    "admin",
    "team",
    "leadership",
    "our-team",
    "who-we-are",
    "meet-our",
    "personnel",
    "board",
    "principal",
    "superintendent",
];

const BAD_HOSTS: [&str; 8] = [
    "linktr.ee",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "youtube.com",
    "vimeo.com",
    "docs.google.com",
    "drive.google.com",
];

impl Default for ScoringRules {
    fn default() -> Self {
        let mut bad_url: Vec<&str> = vec![
            "calendar", "athletic", "sports", "admission", "apply", "enroll", "event", "news",
            "blog", "lunch", "menu", "forms", "download",
        ];
        bad_url.extend(BAD_HOSTS);

        Self {
            forced_zero: [
                "contact",
                "contact-us",
                "contactus",
                "contact_us",
                "admission",
                "admissions",
                "apply",
                "enrollment",
                "enroll",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
            url_families: vec![
                KeywordFamily::new(&HIGH_VALUE, 25),
                KeywordFamily::new(&["about", "mission", "vision", "history"], 10),
                KeywordFamily::new(&["contact", "info", "location"], 5),
                KeywordFamily::new(&bad_url, -25),
            ],
            bad_hosts: KeywordFamily::new(&BAD_HOSTS, -40),
            fragment: KeywordFamily::new(
                &["team", "staff", "faculty", "leadership", "directory", "admin"],
                20,
            ),
            staff_like: [
                "staff",
                "faculty",
                "directory",
                "administration",
                "admin",
                "team",
                "leadership",
                "personnel",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
            heading: KeywordFamily::new(&HIGH_VALUE, 10),
            mailto_tiers: vec![
                Tier { min_count: 5, bonus: 40 },
                Tier { min_count: 2, bonus: 25 },
                Tier { min_count: 1, bonus: 10 },
            ],
            name_tiers: vec![
                Tier { min_count: 10, bonus: 30 },
                Tier { min_count: 5, bonus: 15 },
            ],
        }
    }
}

fn tier_bonus(tiers: &[Tier], count: usize) -> i32 {
    tiers
        .iter()
        .find(|tier| count >= tier.min_count)
        .map_or(0, |tier| tier.bonus)
}

impl ScoringRules {
    /// Whether the URL hits the forced-zero family
    pub fn is_forced_zero(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.forced_zero.iter().any(|k| url.contains(k.as_str()))
    }

    /// Pre-fetch score computed from the URL text only
    pub fn score_url(&self, url: &str) -> i32 {
        let url_lower = url.to_lowercase();
        if self.is_forced_zero(&url_lower) {
            return 0;
        }

        let mut score: i32 = self
            .url_families
            .iter()
            .map(|family| family.delta * family.count_matches(&url_lower) as i32)
            .sum();

        let host = Url::parse(&url_lower)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        if self.bad_hosts.any_match(&host) {
            score += self.bad_hosts.delta;
        }

        if let Some((_, fragment)) = url_lower.split_once('#') {
            if self.fragment.any_match(fragment) {
                score += self.fragment.delta;
            }
        }

        score
    }

    /// Score contributed by the fetched content
    pub fn score_content(&self, signals: &PageSignals) -> i32 {
        let mut score = tier_bonus(&self.mailto_tiers, signals.mailto_count);
        score += tier_bonus(&self.name_tiers, signals.name_matches);
        if self.heading.any_match(&signals.heading_text) {
            score += self.heading.delta;
        }
        score
    }

    /// Whether the URL looks like a staff listing
    pub fn is_staff_like(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.staff_like.iter().any(|k| url.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_zero_short_circuits() {
        let rules = ScoringRules::default();
        assert_eq!(rules.score_url("https://school.org/staff/contact-us"), 0);
        assert_eq!(rules.score_url("https://school.org/Admissions"), 0);
    }

    #[test]
    fn test_high_value_keywords_accumulate() {
        let rules = ScoringRules::default();
        // "staff" and "directory"
        assert_eq!(rules.score_url("https://school.org/staff-directory"), 50);
        // "administration" also contains "admin"
        assert_eq!(rules.score_url("https://school.org/administration"), 50);
        assert_eq!(rules.score_url("https://school.org/about"), 10);
    }

    #[test]
    fn test_penalties() {
        let rules = ScoringRules::default();
        assert_eq!(rules.score_url("https://school.org/calendar"), -25);
        // keyword penalty plus host penalty
        assert_eq!(rules.score_url("https://www.facebook.com/school"), -65);
        assert!(rules.score_url("https://school.org/facebook.com/page") < 0);
    }

    #[test]
    fn test_fragment_bonus() {
        let rules = ScoringRules::default();
        assert_eq!(rules.score_url("https://school.org/#leadership"), 45);
        assert_eq!(rules.score_url("https://school.org/#top"), 0);
    }

    #[test]
    fn test_content_tiers() {
        let rules = ScoringRules::default();
        let signals = PageSignals {
            title: None,
            mailto_count: 6,
            name_matches: 7,
            heading_text: "meet our faculty".to_string(),
        };
        assert_eq!(rules.score_content(&signals), 40 + 15 + 10);

        let sparse = PageSignals {
            mailto_count: 1,
            ..Default::default()
        };
        assert_eq!(rules.score_content(&sparse), 10);
    }

    #[test]
    fn test_staff_like() {
        let rules = ScoringRules::default();
        assert!(rules.is_staff_like("https://school.org/Our-Faculty"));
        assert!(!rules.is_staff_like("https://school.org/about"));
    }
}
