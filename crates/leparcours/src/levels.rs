//! Save levels
//!
//! A save level is a checkpoint at which a partial proposal is sent to the
//! backend. Each level owns a fixed field list; every list starts with the
//! reference number so later submissions address the proposal created by
//! [`SaveLevel::InitialSave`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProposalError, Result};
use crate::fields::Field;

/// A partial-submission checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveLevel {
    /// Project name changed
    ProjectName,
    /// Owning area changed
    ProjectArea,
    /// Project type and intervention types set
    ProjectType,
    /// First financial year set
    FinancialStartYear,
    /// Last financial year set
    FinancialEndYear,
    /// Proposal created; assigns the reference number
    InitialSave,
    /// Important dates chain completed
    ImportantDates,
    /// Urgency set
    Urgency,
}

impl SaveLevel {
    /// Every level.
    pub const ALL: [SaveLevel; 8] = [
        SaveLevel::ProjectName,
        SaveLevel::ProjectArea,
        SaveLevel::ProjectType,
        SaveLevel::FinancialStartYear,
        SaveLevel::FinancialEndYear,
        SaveLevel::InitialSave,
        SaveLevel::ImportantDates,
        SaveLevel::Urgency,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            SaveLevel::ProjectName => "project-name",
            SaveLevel::ProjectArea => "project-area",
            SaveLevel::ProjectType => "project-type",
            SaveLevel::FinancialStartYear => "financial-start-year",
            SaveLevel::FinancialEndYear => "financial-end-year",
            SaveLevel::InitialSave => "initial-save",
            SaveLevel::ImportantDates => "important-dates",
            SaveLevel::Urgency => "urgency",
        }
    }
}

impl fmt::Display for SaveLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaveLevel {
    type Err = ProposalError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ProposalError::UnknownSaveLevel(s.to_string()))
    }
}

const IMPORTANT_DATES: &[Field] = &[
    Field::ReferenceNumber,
    Field::StartOutlineBusinessCaseMonth,
    Field::StartOutlineBusinessCaseYear,
    Field::CompleteOutlineBusinessCaseMonth,
    Field::CompleteOutlineBusinessCaseYear,
    Field::AwardContractMonth,
    Field::AwardContractYear,
    Field::StartWorkMonth,
    Field::StartWorkYear,
    Field::StartBenefitsMonth,
    Field::StartBenefitsYear,
    Field::CouldStartEarly,
    Field::EarliestStartMonth,
    Field::EarliestStartYear,
];

/// Field list owned by each save level.
static SAVE_LEVEL_FIELDS: &[(SaveLevel, &[Field])] = &[
    (SaveLevel::ProjectName, &[Field::ReferenceNumber, Field::Name]),
    (SaveLevel::ProjectArea, &[Field::ReferenceNumber, Field::AreaId]),
    (
        SaveLevel::ProjectType,
        &[
            Field::ReferenceNumber,
            Field::ProjectType,
            Field::InterventionTypes,
            Field::PrimaryInterventionType,
        ],
    ),
    (
        SaveLevel::FinancialStartYear,
        &[Field::ReferenceNumber, Field::FinancialStartYear],
    ),
    (
        SaveLevel::FinancialEndYear,
        &[Field::ReferenceNumber, Field::FinancialEndYear],
    ),
    (
        SaveLevel::InitialSave,
        &[
            Field::ReferenceNumber,
            Field::Name,
            Field::AreaId,
            Field::ProjectType,
            Field::InterventionTypes,
            Field::PrimaryInterventionType,
            Field::FinancialStartYear,
            Field::FinancialEndYear,
        ],
    ),
    (SaveLevel::ImportantDates, IMPORTANT_DATES),
    (
        SaveLevel::Urgency,
        &[
            Field::ReferenceNumber,
            Field::UrgencyReason,
            Field::UrgencyDetails,
        ],
    ),
];

/// Field list owned by `level`.
///
/// A level without an entry is a broken table and surfaces as
/// [`ProposalError::UnknownSaveLevel`].
pub fn fields_for(level: SaveLevel) -> Result<&'static [Field]> {
    SAVE_LEVEL_FIELDS
        .iter()
        .find(|(candidate, _)| *candidate == level)
        .map(|(_, fields)| *fields)
        .ok_or_else(|| ProposalError::UnknownSaveLevel(level.to_string()))
}
