//! Name and region filter applied to discovered organizations.
//!
//! Churches, camps and ministries show up alongside schools in places search
//! results. A name containing an exclusion keyword is rejected unless it also
//! names a school.

use std::fmt;

use tracing::debug;

use crate::discovery::TargetRegion;
use crate::types::Organization;

/// Name fragments of non-school organizations
pub const EXCLUSION_KEYWORDS: [&str; 13] = [
    "church",
    "camp",
    "ministry",
    "fellowship",
    "worship center",
    "bible institute",
    "seminary",
    "mission",
    "outreach center",
    "worship",
    "pastor",
    "minister",
    "chapel",
];

/// Name fragments that mark an organization as a school
pub const SCHOOL_KEYWORDS: [&str; 13] = [
    "school",
    "academy",
    "preschool",
    "elementary",
    "high school",
    "middle school",
    "primary school",
    "secondary school",
    "college",
    "university",
    "prep",
    "preparatory",
    "education",
];

/// Why an organization was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    EmptyName,
    /// Matched an exclusion keyword without any school keyword
    NotASchool { keyword: String },
    OutOfRegion,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyName => write!(f, "empty name"),
            RejectReason::NotASchool { keyword } => {
                write!(f, "matched '{keyword}' with no school keyword")
            }
            RejectReason::OutOfRegion => write!(f, "outside the target state"),
        }
    }
}

/// Outcome of filtering one organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Keep,
    Reject(RejectReason),
}

impl FilterDecision {
    pub fn is_keep(&self) -> bool {
        matches!(self, FilterDecision::Keep)
    }
}

/// Keyword and region filter
#[derive(Debug, Clone)]
pub struct OrganizationFilter {
    exclusion_keywords: Vec<String>,
    school_keywords: Vec<String>,
    region: Option<TargetRegion>,
}

impl Default for OrganizationFilter {
    fn default() -> Self {
        Self {
            exclusion_keywords: EXCLUSION_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            school_keywords: SCHOOL_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            region: None,
        }
    }
}

impl OrganizationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also reject organizations outside `region`
    pub fn with_region(mut self, region: TargetRegion) -> Self {
        self.region = Some(region);
        self
    }

    /// Decide whether a name belongs to a school
    pub fn check_name(&self, name: &str) -> FilterDecision {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return FilterDecision::Reject(RejectReason::EmptyName);
        }

        let Some(keyword) = self
            .exclusion_keywords
            .iter()
            .find(|k| name.contains(k.as_str()))
        else {
            return FilterDecision::Keep;
        };

        if self.school_keywords.iter().any(|k| name.contains(k.as_str())) {
            FilterDecision::Keep
        } else {
            FilterDecision::Reject(RejectReason::NotASchool {
                keyword: keyword.clone(),
            })
        }
    }

    pub fn check(&self, organization: &Organization) -> FilterDecision {
        let decision = self.check_name(&organization.name);
        if !decision.is_keep() {
            return decision;
        }

        if let Some(region) = &self.region {
            if !region.matches(&organization.detected_state, &organization.address) {
                return FilterDecision::Reject(RejectReason::OutOfRegion);
            }
        }
        FilterDecision::Keep
    }

    /// Split organizations into kept records and rejected records with reasons
    pub fn apply(
        &self,
        organizations: Vec<Organization>,
    ) -> (Vec<Organization>, Vec<(Organization, RejectReason)>) {
        let mut kept = Vec::new();
        let mut rejected = Vec::new();

        for organization in organizations {
            match self.check(&organization) {
                FilterDecision::Keep => kept.push(organization),
                FilterDecision::Reject(reason) => {
                    debug!(name = %organization.name, %reason, "filtered out");
                    rejected.push((organization, reason));
                }
            }
        }

        (kept, rejected)
    }
}
