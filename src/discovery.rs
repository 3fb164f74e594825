//! # Discovery Module
//!
//! Finds candidate schools through a places text-search API under a hard,
//! run-wide call budget.
//!
//! ## Key Components
//!
//! - `CallBudget`: Shared atomic cap on outbound API calls
//! - `PlacesClient`: Text-search and place-details requests
//! - `DiscoveryClient`: Templated queries per geographic unit with run-wide dedup
//! - `TargetRegion`: State resolution and in-region checks
//!
//! Every outbound request, including follow-up pages and details lookups,
//! reserves budget first. A failed query is logged and counted as zero
//! results.

mod budget;
mod client;
mod config;
mod error;
mod places;
mod region;
mod units;

use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;

use serde::Serialize;

pub use budget::CallBudget;
pub use client::{DiscoveryClient, DiscoveryReport, DiscoveryStats, DiscoveryStop};
pub use config::{DEFAULT_PLACES_BASE_URL, DiscoveryConfig, DiscoveryConfigBuilder};
pub use error::DiscoveryError;
pub use places::{PlaceDetails, PlaceResult, PlacesClient, SearchPage};
pub use region::{AddressComponent, STATES, TargetRegion, detect_state_and_county};
pub use units::{
    QUERY_KINDS, SearchMode, city_query, county_queries, found_via, load_units, select_units,
    unit_queries,
};

use crate::types::Organization;

/// Keep the first record for each place identifier
pub fn dedup(records: impl IntoIterator<Item = Organization>) -> Vec<Organization> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.place_id.clone()))
        .collect()
}

/// Column order of the organizations artifact
pub const ORGANIZATION_COLUMNS: [&str; 14] = [
    "place_id",
    "name",
    "address",
    "website",
    "phone",
    "rating",
    "user_ratings_total",
    "types",
    "business_status",
    "county",
    "state",
    "detected_state",
    "detected_county",
    "found_via",
];

#[derive(Serialize)]
struct OrganizationRow<'a> {
    place_id: &'a str,
    name: &'a str,
    address: &'a str,
    website: &'a str,
    phone: &'a str,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    types: String,
    business_status: &'a str,
    county: &'a str,
    state: &'a str,
    detected_state: &'a str,
    detected_county: &'a str,
    found_via: &'a str,
}

impl<'a> From<&'a Organization> for OrganizationRow<'a> {
    fn from(org: &'a Organization) -> Self {
        Self {
            place_id: &org.place_id,
            name: &org.name,
            address: &org.address,
            website: org.website.as_deref().unwrap_or(""),
            phone: org.phone.as_deref().unwrap_or(""),
            rating: org.rating,
            user_ratings_total: org.user_ratings_total,
            types: org.types.join(", "),
            business_status: org.business_status.as_deref().unwrap_or(""),
            county: &org.county,
            state: &org.state,
            detected_state: &org.detected_state,
            detected_county: &org.detected_county,
            found_via: &org.found_via,
        }
    }
}

/// Write organizations as CSV; the header is written even with no rows
pub fn write_organizations_csv(path: &Path, organizations: &[Organization]) -> Result<(), DiscoveryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(File::create(path)?);
    writer.write_record(ORGANIZATION_COLUMNS)?;
    for organization in organizations {
        writer.serialize(OrganizationRow::from(organization))?;
    }
    writer.flush()?;
    Ok(())
}
