//! Proposal classification codes
//!
//! Project types, intervention types and urgency reasons as they travel on
//! the wire (short upper-case codes, snake_case reasons).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of project work a proposal covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectType {
    /// New flood defence
    #[serde(rename = "DEF")]
    Defence,
    /// Refurbishment of an existing asset
    #[serde(rename = "REF")]
    Refurbishment,
    /// Repair of an existing asset
    #[serde(rename = "REP")]
    Repair,
    /// Habitat creation
    #[serde(rename = "HCR")]
    HabitatCreation,
    /// Strategy
    #[serde(rename = "STR")]
    Strategy,
    /// Study
    #[serde(rename = "STU")]
    Study,
    /// Environmental outcomes
    #[serde(rename = "ELO")]
    EnvironmentalOutcomes,
}

impl ProjectType {
    /// Every project type, in display order.
    pub const ALL: [ProjectType; 7] = [
        ProjectType::Defence,
        ProjectType::Refurbishment,
        ProjectType::Repair,
        ProjectType::HabitatCreation,
        ProjectType::Strategy,
        ProjectType::Study,
        ProjectType::EnvironmentalOutcomes,
    ];

    /// Wire code.
    pub fn code(self) -> &'static str {
        match self {
            ProjectType::Defence => "DEF",
            ProjectType::Refurbishment => "REF",
            ProjectType::Repair => "REP",
            ProjectType::HabitatCreation => "HCR",
            ProjectType::Strategy => "STR",
            ProjectType::Study => "STU",
            ProjectType::EnvironmentalOutcomes => "ELO",
        }
    }

    /// Look up a type by its wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Whether proposals of this type must classify their interventions.
    ///
    /// Drives the conditional `intervention-types` and
    /// `primary-intervention-type` steps.
    pub fn requires_intervention_types(self) -> bool {
        matches!(
            self,
            ProjectType::Defence | ProjectType::Refurbishment | ProjectType::Repair
        )
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| format!("unknown project type: {s}"))
    }
}

/// Sub-classification of project work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterventionType {
    /// Natural flood management
    #[serde(rename = "NFM")]
    NaturalFloodManagement,
    /// Property flood resilience
    #[serde(rename = "PFR")]
    PropertyFloodResilience,
    /// Sustainable drainage systems
    #[serde(rename = "SDS")]
    SustainableDrainage,
    /// Anything else
    #[serde(rename = "OTH")]
    Other,
}

impl InterventionType {
    /// Every intervention type, in display order.
    pub const ALL: [InterventionType; 4] = [
        InterventionType::NaturalFloodManagement,
        InterventionType::PropertyFloodResilience,
        InterventionType::SustainableDrainage,
        InterventionType::Other,
    ];

    /// Wire code.
    pub fn code(self) -> &'static str {
        match self {
            InterventionType::NaturalFloodManagement => "NFM",
            InterventionType::PropertyFloodResilience => "PFR",
            InterventionType::SustainableDrainage => "SDS",
            InterventionType::Other => "OTH",
        }
    }

    /// Look up an intervention type by its wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl fmt::Display for InterventionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Why a proposal is urgent, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyReason {
    /// Not urgent
    NotUrgent,
    /// Statutory need
    StatutoryNeed,
    /// Legal need
    LegalNeed,
    /// Health and safety
    HealthAndSafety,
    /// Emergency works
    EmergencyWorks,
    /// Time-limited funding or opportunity
    TimeLimited,
}

impl UrgencyReason {
    /// Every reason, in display order.
    pub const ALL: [UrgencyReason; 6] = [
        UrgencyReason::NotUrgent,
        UrgencyReason::StatutoryNeed,
        UrgencyReason::LegalNeed,
        UrgencyReason::HealthAndSafety,
        UrgencyReason::EmergencyWorks,
        UrgencyReason::TimeLimited,
    ];

    /// Wire code.
    pub fn code(self) -> &'static str {
        match self {
            UrgencyReason::NotUrgent => "not_urgent",
            UrgencyReason::StatutoryNeed => "statutory_need",
            UrgencyReason::LegalNeed => "legal_need",
            UrgencyReason::HealthAndSafety => "health_and_safety",
            UrgencyReason::EmergencyWorks => "emergency_works",
            UrgencyReason::TimeLimited => "time_limited",
        }
    }

    /// Look up a reason by its wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }

    /// Every reason except `not_urgent` needs a supporting explanation.
    pub fn requires_details(self) -> bool {
        self != UrgencyReason::NotUrgent
    }
}
