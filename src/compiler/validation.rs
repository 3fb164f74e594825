//! Field cleaning and validation for extracted contacts

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email format regex")
});

static HAS_LETTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z]").expect("valid letter regex"));

/// Local parts of shared mailboxes rather than people
pub const GENERIC_LOCAL_PARTS: [&str; 9] = [
    "info",
    "contact",
    "admin",
    "office",
    "webmaster",
    "noreply",
    "no-reply",
    "hello",
    "support",
];

/// Names models produce when they make people up
pub const PLACEHOLDER_NAMES: [&str; 16] = [
    "john doe",
    "jane doe",
    "john smith",
    "jane smith",
    "bob jones",
    "test user",
    "example name",
    "sample user",
    "john test",
    "jane test",
    "placeholder",
    "demo user",
    "john example",
    "jane example",
    "test name",
    "sample name",
];

/// Page text that gets mistaken for names
pub const GENERIC_NAME_TEXT: [&str; 13] = [
    "about",
    "admissions",
    "contact us",
    "home",
    "welcome",
    "staff directory",
    "faculty",
    "administration",
    "our team",
    "meet our",
    "who we are",
    "school information",
    "general information",
];

/// Honorifics stripped before a name is split
pub const NAME_PREFIXES: [&str; 8] = ["mr.", "mrs.", "ms.", "dr.", "miss", "father", "fr.", "rev."];

/// Normalize an email address, or `None` when nothing valid remains.
///
/// Zero-width characters, the byte order mark and any other non-ASCII
/// characters are removed before the format check. The result is lowercased.
pub fn clean_email(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned.chars().any(char::is_whitespace) || cleaned.matches('@').count() != 1 {
        return None;
    }
    if !EMAIL_FORMAT.is_match(cleaned) {
        return None;
    }
    Some(cleaned.to_lowercase())
}

/// Whether a cleaned address belongs to a shared mailbox
pub fn is_generic_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, _)| GENERIC_LOCAL_PARTS.contains(&local))
}

/// `phrase` appears in `text` as whole words
fn contains_phrase(text: &str, phrase: &str) -> bool {
    format!(" {text} ").contains(&format!(" {phrase} "))
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Whether `name` is one of the stand-in names models invent
pub fn is_placeholder_name(name: &str) -> bool {
    PLACEHOLDER_NAMES.contains(&normalize_name(name).as_str())
}

/// Whether `name` plausibly names a real person.
///
/// Placeholder names are checked separately with [`is_placeholder_name`],
/// since a placeholder backed by a real address is kept.
pub fn is_valid_name(name: &str) -> bool {
    let words = name.split_whitespace().count();
    if words == 0 || words > 5 || !HAS_LETTER.is_match(name) {
        return false;
    }

    let normalized = normalize_name(name);
    !GENERIC_NAME_TEXT
        .iter()
        .any(|text| contains_phrase(&normalized, text))
}

/// Split a full name into first and last, dropping a leading honorific.
///
/// The first word is the first name and everything after it the last name.
pub fn split_name(name: &str) -> (String, String) {
    let mut words: Vec<&str> = name.split_whitespace().collect();
    if words.len() > 1 && NAME_PREFIXES.contains(&words[0].to_lowercase().as_str()) {
        words.remove(0);
    }

    match words.split_first() {
        None => (String::new(), String::new()),
        Some((first, rest)) => (first.to_string(), rest.join(" ")),
    }
}

/// Format a US number as `(NNN) NNN-NNNN`; anything else passes through trimmed
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let digits = match digits.len() {
        10 => digits.as_str(),
        11 if digits.starts_with('1') => &digits[1..],
        _ => return raw.trim().to_string(),
    };
    format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_email() {
        assert_eq!(clean_email("  JDoe@Grace.org "), Some("jdoe@grace.org".to_string()));
        assert_eq!(clean_email("\u{feff}\u{200b}jdoe@grace.org"), Some("jdoe@grace.org".to_string()));
        assert_eq!(clean_email("jdoe@grace"), None);
        assert_eq!(clean_email("Bobcat Heavy Civil"), None);
        assert_eq!(clean_email("a@b@grace.org"), None);
        assert_eq!(clean_email("jane doe@grace.org"), None);
        assert_eq!(clean_email(""), None);
    }

    #[test]
    fn test_generic_email() {
        assert!(is_generic_email("info@grace.org"));
        assert!(is_generic_email("no-reply@grace.org"));
        assert!(!is_generic_email("jinfo@grace.org"));
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("Mary Ann Smith"));
        assert!(is_valid_name("Tom Holmes"));
        assert!(is_valid_name("Thomeson"));
        assert!(is_valid_name("John Doe"));
        assert!(!is_valid_name("Staff Directory"));
        assert!(!is_valid_name("About Us"));
        assert!(!is_valid_name("123 456"));
        assert!(!is_valid_name("One Two Three Four Five Six"));
        assert!(!is_valid_name("   "));
    }

    #[test]
    fn test_placeholder_names() {
        assert!(is_placeholder_name("John Doe"));
        assert!(is_placeholder_name("  jane   DOE "));
        assert!(is_placeholder_name("Placeholder"));
        assert!(!is_placeholder_name("Jane Doerr"));
        assert!(!is_placeholder_name("Mary Smith"));
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("Dr. Jane Doe"), ("Jane".to_string(), "Doe".to_string()));
        assert_eq!(split_name("Rev. John Paul Roe"), ("John".to_string(), "Paul Roe".to_string()));
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
        assert_eq!(split_name(""), (String::new(), String::new()));
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("302.555.0100"), "(302) 555-0100");
        assert_eq!(format_phone("+1 302-555-0100"), "(302) 555-0100");
        assert_eq!(format_phone("ext. 12"), "ext. 12");
        let once = format_phone("3025550100");
        assert_eq!(format_phone(&once), once);
    }
}
