//! Target-state detection for places results

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::discovery::error::DiscoveryError;

/// `, TX 75001` style postal suffix
static POSTAL_STATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([A-Z]{2})\s+\d{5}").expect("valid postal regex"));

/// Lowercase state name to postal abbreviation
pub const STATES: [(&str, &str); 50] = [
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
];

/// One entry of a places result's `address_components`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AddressComponent {
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// The state a discovery run is restricted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRegion {
    /// Title-cased name, e.g. `Rhode Island`
    pub name: String,

    /// Postal abbreviation, e.g. `RI`
    pub abbreviation: String,
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl TargetRegion {
    /// Resolve a state from its name or abbreviation.
    ///
    /// Accepts `Rhode Island`, `rhode_island` and `RI` alike.
    pub fn resolve(state: &str) -> Result<Self, DiscoveryError> {
        let normalized = state.trim().replace('_', " ").to_lowercase();
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        STATES
            .iter()
            .find(|(name, abbreviation)| {
                *name == normalized || abbreviation.eq_ignore_ascii_case(&normalized)
            })
            .map(|(name, abbreviation)| Self {
                name: title_case(name),
                abbreviation: abbreviation.to_string(),
            })
            .ok_or_else(|| DiscoveryError::UnknownState(state.to_string()))
    }

    /// File stem of the state's unit list, e.g. `rhode_island`
    pub fn file_stem(&self) -> String {
        self.name.to_lowercase().replace(' ', "_")
    }

    /// Whether a result belongs to this state.
    ///
    /// Any one signal is enough: the detected administrative area, the
    /// abbreviation after a comma, the full state name, or a postal suffix.
    pub fn matches(&self, detected_state: &str, formatted_address: &str) -> bool {
        let detected = detected_state.trim();
        if !detected.is_empty()
            && (detected.eq_ignore_ascii_case(&self.abbreviation)
                || detected.eq_ignore_ascii_case(&self.name)
                || detected.eq_ignore_ascii_case(&self.file_stem()))
        {
            return true;
        }

        let address = formatted_address.to_uppercase();
        let abbreviation = self.abbreviation.as_str();
        if address.contains(&format!(", {abbreviation} "))
            || address.ends_with(&format!(", {abbreviation}"))
        {
            return true;
        }

        if address.contains(&format!(" {}", self.name.to_uppercase())) {
            return true;
        }

        POSTAL_STATE
            .captures(formatted_address)
            .is_some_and(|captures| &captures[1] == abbreviation)
    }
}

/// Detected `(state, county)` from a result's address components.
///
/// The state is the first level-1 area's short name and the county is the
/// first level-2 area's long name; either may be empty.
pub fn detect_state_and_county(components: &[AddressComponent]) -> (String, String) {
    let mut state = String::new();
    let mut county = String::new();

    for component in components {
        let has = |kind: &str| component.types.iter().any(|t| t == kind);
        if state.is_empty() && has("administrative_area_level_1") {
            state = if component.short_name.is_empty() {
                component.long_name.clone()
            } else {
                component.short_name.clone()
            };
        }
        if county.is_empty() && has("administrative_area_level_2") {
            county = if component.long_name.is_empty() {
                component.short_name.clone()
            } else {
                component.long_name.clone()
            };
        }
    }

    (state, county)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_accepts_names_and_abbreviations() {
        let ri = TargetRegion::resolve("rhode_island").unwrap();
        assert_eq!(ri.name, "Rhode Island");
        assert_eq!(ri.abbreviation, "RI");
        assert_eq!(ri.file_stem(), "rhode_island");

        assert_eq!(TargetRegion::resolve("tx").unwrap().name, "Texas");
        assert_eq!(TargetRegion::resolve(" New  York ").unwrap().abbreviation, "NY");
        assert!(TargetRegion::resolve("Atlantis").is_err());
    }

    #[test]
    fn test_matches_detected_state() {
        let de = TargetRegion::resolve("Delaware").unwrap();
        assert!(de.matches("DE", ""));
        assert!(de.matches("delaware", ""));
        assert!(!de.matches("MD", "12 Main St, Elkton, MD 21921, USA"));
    }

    #[test]
    fn test_matches_address_fallbacks() {
        let de = TargetRegion::resolve("Delaware").unwrap();
        assert!(de.matches("", "12 Main St, Dover, DE 19901, USA"));
        assert!(de.matches("", "Dover, DE"));
        assert!(de.matches("", "Somewhere in Delaware"));
        assert!(de.matches("", "12 Main St,DE  19901"));
        assert!(!de.matches("", "12 Main St, Denver, CO 80202"));
    }

    #[test]
    fn test_detect_state_and_county() {
        let components = vec![
            AddressComponent {
                long_name: "Dover".to_string(),
                short_name: "Dover".to_string(),
                types: vec!["locality".to_string()],
            },
            AddressComponent {
                long_name: "Kent County".to_string(),
                short_name: "Kent County".to_string(),
                types: vec!["administrative_area_level_2".to_string()],
            },
            AddressComponent {
                long_name: "Delaware".to_string(),
                short_name: "DE".to_string(),
                types: vec!["administrative_area_level_1".to_string(), "political".to_string()],
            },
        ];
        assert_eq!(
            detect_state_and_county(&components),
            ("DE".to_string(), "Kent County".to_string())
        );
        assert_eq!(detect_state_and_county(&[]), (String::new(), String::new()));
    }
}
