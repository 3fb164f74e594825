//! Budget-bounded discovery over a list of geographic units

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::discovery::budget::CallBudget;
use crate::discovery::config::DiscoveryConfig;
use crate::discovery::places::{PlaceResult, PlacesClient};
use crate::discovery::region::{TargetRegion, detect_state_and_county};
use crate::discovery::units::{SearchMode, found_via, unit_queries};
use crate::pipeline::ShutdownSignal;
use crate::types::Organization;

/// Why discovery stopped issuing queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStop {
    /// Every query for every unit was issued
    #[default]
    Completed,
    /// The call budget ran out
    BudgetExhausted,
    /// Shutdown was requested
    Interrupted,
}

/// Counters for a discovery run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryStats {
    pub units_searched: usize,
    pub queries: usize,
    pub failed_queries: usize,
    pub details_calls: usize,
    pub out_of_region: usize,
    pub duplicates: usize,
    pub with_website: usize,
}

/// Organizations found by a discovery run
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub organizations: Vec<Organization>,
    pub stats: DiscoveryStats,
    pub stop: DiscoveryStop,
}

/// Issues templated queries for each unit while the budget lasts.
///
/// Place identifiers are deduplicated across the whole run: an identifier
/// is recorded on first sight, even when that result is out of region.
#[derive(Debug)]
pub struct DiscoveryClient {
    places: PlacesClient,
    budget: CallBudget,
    region: TargetRegion,
    config: DiscoveryConfig,
    seen: HashSet<String>,
    stats: DiscoveryStats,
}

impl DiscoveryClient {
    pub fn new(
        places: PlacesClient,
        budget: CallBudget,
        region: TargetRegion,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            places,
            budget,
            region,
            config,
            seen: HashSet::new(),
            stats: DiscoveryStats::default(),
        }
    }

    pub fn budget(&self) -> &CallBudget {
        &self.budget
    }

    pub fn region(&self) -> &TargetRegion {
        &self.region
    }

    /// Search every unit, stopping early on budget exhaustion or shutdown.
    ///
    /// # Arguments
    ///
    /// * `units` - County or city names, in the order to search them
    /// * `mode` - Whether units are counties or cities
    /// * `shutdown` - Checked before every query
    ///
    /// # Returns
    ///
    /// Everything found up to the stopping point. Failed queries count as
    /// zero results and never end the run.
    #[instrument(skip(self, units, shutdown), fields(state = %self.region.name, units = units.len()))]
    pub async fn discover(
        &mut self,
        units: &[String],
        mode: SearchMode,
        shutdown: &ShutdownSignal,
    ) -> DiscoveryReport {
        let mut organizations = Vec::new();
        let mut stop = DiscoveryStop::Completed;

        'units: for (index, unit) in units.iter().enumerate() {
            let queries = unit_queries(mode, unit, &self.region.name, self.config.max_search_terms);
            info!(unit = %unit, "searching unit {}/{}", index + 1, units.len());
            let before = organizations.len();

            for query in queries {
                if shutdown.is_requested() {
                    stop = DiscoveryStop::Interrupted;
                    break 'units;
                }
                if self.budget.is_exhausted() {
                    stop = DiscoveryStop::BudgetExhausted;
                    break 'units;
                }
                let found = self.search_query(&query, unit).await;
                organizations.extend(found);
            }

            self.stats.units_searched += 1;
            info!(
                unit = %unit,
                found = organizations.len() - before,
                total = organizations.len(),
                api_calls = self.budget.used(),
                "unit searched"
            );
        }

        if stop == DiscoveryStop::Completed && self.budget.is_exhausted() {
            stop = DiscoveryStop::BudgetExhausted;
        }

        info!(
            organizations = organizations.len(),
            api_calls = self.budget.used(),
            ?stop,
            "discovery finished"
        );

        DiscoveryReport {
            organizations,
            stats: self.stats.clone(),
            stop,
        }
    }

    /// Run one query including its follow-up pages
    async fn search_query(&mut self, query: &str, unit: &str) -> Vec<Organization> {
        let mut organizations = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            if page_token.is_some() {
                tokio::time::sleep(self.config.page_delay()).await;
            }
            if !self.budget.try_acquire() {
                debug!(query, "budget exhausted before request");
                break;
            }
            self.stats.queries += 1;

            let page = match self.places.text_search(query, page_token.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(query, "query failed, treating as no results: {}", e);
                    self.stats.failed_queries += 1;
                    break;
                }
            };

            for result in page.results {
                if let Some(organization) = self.accept(result, unit, query).await {
                    organizations.push(organization);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tokio::time::sleep(self.config.query_delay()).await;
        organizations
    }

    /// Turn a result into an organization if it is new and in region
    async fn accept(&mut self, result: PlaceResult, unit: &str, query: &str) -> Option<Organization> {
        if result.place_id.is_empty() {
            return None;
        }
        if !self.seen.insert(result.place_id.clone()) {
            self.stats.duplicates += 1;
            return None;
        }

        let (detected_state, detected_county) = detect_state_and_county(&result.address_components);
        if !self.region.matches(&detected_state, &result.formatted_address) {
            debug!(name = %result.name, address = %result.formatted_address, "out of region");
            self.stats.out_of_region += 1;
            return None;
        }

        let mut website = result.website.filter(|w| !w.trim().is_empty());
        let mut phone = result.formatted_phone_number.filter(|p| !p.trim().is_empty());

        if website.is_none() && self.config.fetch_details {
            if self.budget.try_acquire() {
                self.stats.details_calls += 1;
                match self.places.place_details(&result.place_id).await {
                    Ok(details) => {
                        website = details.website;
                        phone = phone.or(details.phone);
                    }
                    Err(e) => warn!(place_id = %result.place_id, "details lookup failed: {}", e),
                }
                tokio::time::sleep(self.config.query_delay()).await;
            } else {
                debug!(place_id = %result.place_id, "budget exhausted, skipping details lookup");
            }
        }

        if website.is_some() {
            self.stats.with_website += 1;
        }

        let county_source = if detected_county.is_empty() {
            unit
        } else {
            detected_county.as_str()
        };

        Some(Organization {
            place_id: result.place_id,
            name: result.name,
            address: result.formatted_address,
            website,
            phone,
            rating: result.rating,
            user_ratings_total: result.user_ratings_total,
            types: result.types,
            business_status: result.business_status,
            county: county_source.replace("County", "").trim().to_string(),
            state: self.region.name.clone(),
            detected_state,
            detected_county,
            found_via: found_via(query).to_string(),
        })
    }
}
