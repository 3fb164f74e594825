//! Geographic units and the queries issued for them

use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;

use crate::discovery::error::DiscoveryError;
use crate::discovery::region::TargetRegion;

/// Query kinds searched in every county, most productive first
pub const QUERY_KINDS: [&str; 16] = [
    "Christian schools",
    "Christian academy",
    "Catholic schools",
    "Catholic elementary school",
    "Baptist schools",
    "Methodist schools",
    "Lutheran schools",
    "Presbyterian schools",
    "Episcopal schools",
    "Pentecostal schools",
    "Assembly of God schools",
    "Church of God schools",
    "nondenominational Christian schools",
    "evangelical schools",
    "private religious schools",
    "parochial schools",
];

/// How units are turned into queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Every template for each county
    #[default]
    Counties,
    /// One query per city
    Cities,
}

/// Queries for one county, truncated to `max_search_terms`
pub fn county_queries(county: &str, state: &str, max_search_terms: Option<usize>) -> Vec<String> {
    let limit = max_search_terms.unwrap_or(QUERY_KINDS.len());
    QUERY_KINDS
        .iter()
        .take(limit)
        .map(|kind| format!("{kind} in {county} County, {state}"))
        .collect()
}

/// The single query issued for a city
pub fn city_query(city: &str, state: &str) -> String {
    format!("Christian schools in {city}, {state}")
}

/// Queries for a unit in the given mode
pub fn unit_queries(
    mode: SearchMode,
    unit: &str,
    state: &str,
    max_search_terms: Option<usize>,
) -> Vec<String> {
    match mode {
        SearchMode::Counties => county_queries(unit, state, max_search_terms),
        SearchMode::Cities => vec![city_query(unit, state)],
    }
}

/// The query kind, i.e. the text before `" in "`
pub fn found_via(query: &str) -> &str {
    query.split_once(" in ").map_or(query, |(kind, _)| kind)
}

/// Load the county list for a state from `<data_dir>/states/<state>.txt`.
///
/// One unit per line; blank lines and `#` comments are skipped. A missing
/// or empty file is an error.
pub fn load_units(data_dir: &Path, region: &TargetRegion) -> Result<Vec<String>, DiscoveryError> {
    let path = data_dir
        .join("states")
        .join(format!("{}.txt", region.file_stem()));

    let contents = fs::read_to_string(&path).map_err(|e| DiscoveryError::Units {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let units: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    if units.is_empty() {
        return Err(DiscoveryError::Units {
            path,
            reason: "no units listed".to_string(),
        });
    }
    Ok(units)
}

/// Shuffle units and keep the first `batch_size`; 0 keeps all
pub fn select_units(mut units: Vec<String>, batch_size: usize) -> Vec<String> {
    units.shuffle(&mut rand::thread_rng());
    if batch_size > 0 {
        units.truncate(batch_size);
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_county_queries() {
        let all = county_queries("Kent", "Delaware", None);
        assert_eq!(all.len(), 16);
        assert_eq!(all[0], "Christian schools in Kent County, Delaware");
        assert_eq!(all[15], "parochial schools in Kent County, Delaware");

        let two = county_queries("Kent", "Delaware", Some(2));
        assert_eq!(two.len(), 2);
        assert_eq!(two[1], "Christian academy in Kent County, Delaware");
        assert!(county_queries("Kent", "Delaware", Some(0)).is_empty());
    }

    #[test]
    fn test_city_mode_issues_one_query() {
        let queries = unit_queries(SearchMode::Cities, "Dover", "Delaware", Some(5));
        assert_eq!(queries, vec!["Christian schools in Dover, Delaware".to_string()]);
    }

    #[test]
    fn test_found_via() {
        assert_eq!(found_via("Catholic schools in Kent County, Delaware"), "Catholic schools");
        assert_eq!(found_via("no separator"), "no separator");
    }

    #[test]
    fn test_load_units_skips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("states")).unwrap();
        fs::write(
            dir.path().join("states").join("rhode_island.txt"),
            "# counties\nBristol\n\n  Kent  \nNewport\n",
        )
        .unwrap();

        let region = TargetRegion::resolve("Rhode Island").unwrap();
        let units = load_units(dir.path(), &region).unwrap();
        assert_eq!(units, vec!["Bristol", "Kent", "Newport"]);
    }

    #[test]
    fn test_load_units_missing_or_empty_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let region = TargetRegion::resolve("Delaware").unwrap();
        assert!(load_units(dir.path(), &region).is_err());

        fs::create_dir_all(dir.path().join("states")).unwrap();
        fs::write(dir.path().join("states").join("delaware.txt"), "# none\n\n").unwrap();
        assert!(matches!(
            load_units(dir.path(), &region),
            Err(DiscoveryError::Units { .. })
        ));
    }

    #[test]
    fn test_select_units_batches_a_permutation() {
        let units: Vec<String> = (0..10).map(|i| format!("County {i}")).collect();
        let all = select_units(units.clone(), 0);
        assert_eq!(
            all.iter().collect::<HashSet<_>>(),
            units.iter().collect::<HashSet<_>>()
        );

        let batch = select_units(units.clone(), 3);
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|u| units.contains(u)));
    }
}
