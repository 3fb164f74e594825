//! Parsing of extraction responses with partial recovery.
//!
//! The model is asked for a JSON array but may wrap it in code fences, stop
//! mid-array when it runs out of tokens, or answer with a pipe table. Each
//! form is tried in turn; a response that fits none yields zero records.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::compiler::split_name;
use crate::types::Contact;

/// One contact as the model reported it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawContact {
    pub first_name: String,
    pub last_name: String,
    /// Combined name, used when first and last names are absent
    pub name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace([' ', '-'], "_")
}

impl RawContact {
    fn from_fields(fields: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| fields.get(*k))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };
        Self {
            first_name: get(&["first_name", "firstname", "first"]),
            last_name: get(&["last_name", "lastname", "last"]),
            name: get(&["name", "full_name", "fullname"]),
            title: get(&["title", "role", "position"]),
            email: get(&["email", "email_address"]),
            phone: get(&["phone", "phone_number", "telephone"]),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let fields = object
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Null => String::new(),
                    _ => return None,
                };
                Some((normalize_key(key), text))
            })
            .collect();
        Some(Self::from_fields(&fields))
    }

    /// Convert into a [`Contact`], splitting a combined name when needed
    pub fn into_contact(self, organization: &str, source_url: &str) -> Contact {
        let (first_name, last_name) = if self.first_name.is_empty() && self.last_name.is_empty() {
            split_name(&self.name)
        } else {
            (self.first_name, self.last_name)
        };
        let optional = |s: String| Some(s).filter(|s| !s.is_empty());

        Contact {
            first_name,
            last_name,
            title: self.title,
            email: optional(self.email),
            phone: optional(self.phone),
            organization: organization.to_string(),
            source_url: source_url.to_string(),
            confidence: 0,
        }
    }
}

fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string, e.g. ```json
        body = rest.split_once('\n').map_or("", |(_, rest)| rest);
    }
    body.trim_end().trim_end_matches("```").trim()
}

fn records_from_json(text: &str) -> Option<Vec<RawContact>> {
    let value: Value = serde_json::from_str(text).ok()?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(object) => object.get("contacts")?.as_array()?,
        _ => return None,
    };
    Some(items.iter().filter_map(RawContact::from_value).collect())
}

/// Recover the well-formed prefix of a truncated or wrapped JSON array
fn salvage_json(text: &str) -> Option<Vec<RawContact>> {
    let start = text.find('[')?;

    if let Some(end) = text.rfind(']').filter(|&end| end > start) {
        if let Some(records) = records_from_json(&text[start..=end]) {
            return Some(records);
        }
    }

    let end = text.rfind('}').filter(|&end| end > start)?;
    records_from_json(&format!("{}]", &text[start..=end]))
}

fn is_separator_row(cells: &[&str]) -> bool {
    cells
        .iter()
        .all(|cell| !cell.is_empty() && cell.chars().all(|c| matches!(c, '-' | ':' | ' ')))
}

const DEFAULT_COLUMNS: [&str; 5] = ["first_name", "last_name", "title", "email", "phone"];

/// Parse a pipe-delimited table, with or without a header row
fn parse_table(text: &str) -> Vec<RawContact> {
    let rows: Vec<Vec<&str>> = text
        .lines()
        .filter(|line| line.contains('|'))
        .map(|line| line.trim().trim_matches('|').split('|').map(str::trim).collect::<Vec<_>>())
        .filter(|cells| !is_separator_row(cells))
        .collect();

    let Some(first) = rows.first() else {
        return Vec::new();
    };

    let normalized: Vec<String> = first.iter().map(|cell| normalize_key(cell)).collect();
    let has_header = normalized
        .iter()
        .any(|cell| matches!(cell.as_str(), "name" | "first_name" | "last_name" | "email" | "title"));
    let (columns, body) = if has_header {
        (normalized, &rows[1..])
    } else {
        (DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(), &rows[..])
    };

    body.iter()
        .map(|cells| {
            let fields = columns
                .iter()
                .cloned()
                .zip(cells.iter().map(|c| c.to_string()))
                .collect();
            RawContact::from_fields(&fields)
        })
        .collect()
}

/// Parse a model response into raw contacts; never fails
pub fn parse_response(text: &str) -> Vec<RawContact> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Vec::new();
    }

    if let Some(records) = records_from_json(body) {
        return records;
    }

    if let Some(records) = salvage_json(body) {
        warn!("recovered {} records from malformed JSON", records.len());
        return records;
    }

    let records = parse_table(body);
    if records.is_empty() {
        debug!("response held no parseable records");
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json() {
        let response = "```json\n[{\"first_name\": \"Jane\", \"last_name\": \"Doe\", \"title\": \"Principal\", \"email\": \"jdoe@grace.org\", \"phone\": null}]\n```";
        let records = parse_response(response);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].first_name, "Jane");
        assert_eq!(records[0].email, "jdoe@grace.org");
        assert_eq!(records[0].phone, "");
    }

    #[test]
    fn test_truncated_json_is_salvaged() {
        let response = r#"[{"name": "Jane Doe", "title": "Principal", "email": "jdoe@grace.org"},
            {"name": "John Roe", "title": "Dean", "email": "jroe@grace.org"},
            {"name": "Ann Lee", "title": "Dir"#;
        let records = parse_response(response);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "John Roe");
    }

    #[test]
    fn test_prose_around_array() {
        let response = "Here are the contacts:\n[{\"name\": \"Jane Doe\", \"title\": \"Principal\"}]\nLet me know!";
        assert_eq!(parse_response(response).len(), 1);
    }

    #[test]
    fn test_pipe_table_with_header() {
        let response = "| Name | Title | Email | Phone |\n|---|---|---|---|\n| Jane Doe | Principal | jdoe@grace.org | 302-555-0100 |\n| John Roe | Dean | | |";
        let records = parse_response(response);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Jane Doe");
        assert_eq!(records[0].phone, "302-555-0100");
        assert_eq!(records[1].email, "");
    }

    #[test]
    fn test_pipe_table_without_header() {
        let records = parse_response("Jane | Doe | Principal | jdoe@grace.org | ");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].last_name, "Doe");
        assert_eq!(records[0].title, "Principal");
    }

    #[test]
    fn test_garbage_is_zero_records() {
        assert!(parse_response("I could not find any contacts.").is_empty());
        assert!(parse_response("").is_empty());
        assert!(parse_response("[]").is_empty());
    }

    #[test]
    fn test_combined_name_is_split() {
        let raw = RawContact {
            name: "Dr. Mary Ann Smith".to_string(),
            title: "Head of School".to_string(),
            ..Default::default()
        };
        let contact = raw.into_contact("Grace Academy", "https://grace.org/staff");
        assert_eq!(contact.first_name, "Mary");
        assert_eq!(contact.last_name, "Ann Smith");
        assert_eq!(contact.email, None);
        assert_eq!(contact.organization, "Grace Academy");
    }
}
