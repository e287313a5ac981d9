//! Answer fields and the draft answer map
//!
//! Every answerable question is a [`Field`] with a stable camelCase wire key.
//! Raw form input is coerced by [`FieldKind`]; input that does not parse is
//! kept verbatim as text so it can be shown back to the caseworker and
//! rejected by the step validator.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::dates::MonthYear;
use crate::types::{InterventionType, ProjectType, UrgencyReason};

/// How raw form strings are interpreted for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text
    Text,
    /// Whole number (years, months, identifiers)
    Integer,
    /// Yes/no
    Flag,
    /// Multi-select
    List,
    /// Single code from a fixed set
    Choice,
}

/// An answerable field of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Server-assigned reference; sourced from the session, never from a form.
    ReferenceNumber,
    /// Project name
    Name,
    /// Owning organisational area
    AreaId,
    /// Project type code
    ProjectType,
    /// Selected intervention type codes
    InterventionTypes,
    /// Primary intervention type code
    PrimaryInterventionType,
    /// First financial year of spend
    FinancialStartYear,
    /// Last financial year of spend
    FinancialEndYear,
    /// Outline business case start (month)
    StartOutlineBusinessCaseMonth,
    /// Outline business case start (year)
    StartOutlineBusinessCaseYear,
    /// Outline business case completion (month)
    CompleteOutlineBusinessCaseMonth,
    /// Outline business case completion (year)
    CompleteOutlineBusinessCaseYear,
    /// Contract award (month)
    AwardContractMonth,
    /// Contract award (year)
    AwardContractYear,
    /// Start of work (month)
    StartWorkMonth,
    /// Start of work (year)
    StartWorkYear,
    /// Start of benefits (month)
    StartBenefitsMonth,
    /// Start of benefits (year)
    StartBenefitsYear,
    /// Whether the project could start earlier than planned
    CouldStartEarly,
    /// Earliest possible start (month)
    EarliestStartMonth,
    /// Earliest possible start (year)
    EarliestStartYear,
    /// Urgency reason code
    UrgencyReason,
    /// Explanation for an urgent proposal
    UrgencyDetails,
}

impl Field {
    /// Every field, in wire order.
    pub const ALL: [Field; 23] = [
        Field::ReferenceNumber,
        Field::Name,
        Field::AreaId,
        Field::ProjectType,
        Field::InterventionTypes,
        Field::PrimaryInterventionType,
        Field::FinancialStartYear,
        Field::FinancialEndYear,
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
        Field::UrgencyReason,
        Field::UrgencyDetails,
    ];

    /// Fields that only make sense for project types requiring interventions.
    pub const INTERVENTION_FIELDS: [Field; 2] =
        [Field::InterventionTypes, Field::PrimaryInterventionType];

    /// Wire key used in forms and payloads.
    pub fn key(self) -> &'static str {
        match self {
            Field::ReferenceNumber => "referenceNumber",
            Field::Name => "name",
            Field::AreaId => "areaId",
            Field::ProjectType => "projectType",
            Field::InterventionTypes => "interventionTypes",
            Field::PrimaryInterventionType => "primaryInterventionType",
            Field::FinancialStartYear => "financialStartYear",
            Field::FinancialEndYear => "financialEndYear",
            Field::StartOutlineBusinessCaseMonth => "startOutlineBusinessCaseMonth",
            Field::StartOutlineBusinessCaseYear => "startOutlineBusinessCaseYear",
            Field::CompleteOutlineBusinessCaseMonth => "completeOutlineBusinessCaseMonth",
            Field::CompleteOutlineBusinessCaseYear => "completeOutlineBusinessCaseYear",
            Field::AwardContractMonth => "awardContractMonth",
            Field::AwardContractYear => "awardContractYear",
            Field::StartWorkMonth => "startWorkMonth",
            Field::StartWorkYear => "startWorkYear",
            Field::StartBenefitsMonth => "startBenefitsMonth",
            Field::StartBenefitsYear => "startBenefitsYear",
            Field::CouldStartEarly => "couldStartEarly",
            Field::EarliestStartMonth => "earliestStartMonth",
            Field::EarliestStartYear => "earliestStartYear",
            Field::UrgencyReason => "urgencyReason",
            Field::UrgencyDetails => "urgencyDetails",
        }
    }

    /// Look up a field by wire key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Input interpretation for this field.
    pub fn kind(self) -> FieldKind {
        match self {
            Field::ReferenceNumber | Field::Name | Field::UrgencyDetails => FieldKind::Text,
            Field::ProjectType | Field::PrimaryInterventionType | Field::UrgencyReason => {
                FieldKind::Choice
            }
            Field::InterventionTypes => FieldKind::List,
            Field::CouldStartEarly => FieldKind::Flag,
            Field::AreaId
            | Field::FinancialStartYear
            | Field::FinancialEndYear
            | Field::StartOutlineBusinessCaseMonth
            | Field::StartOutlineBusinessCaseYear
            | Field::CompleteOutlineBusinessCaseMonth
            | Field::CompleteOutlineBusinessCaseYear
            | Field::AwardContractMonth
            | Field::AwardContractYear
            | Field::StartWorkMonth
            | Field::StartWorkYear
            | Field::StartBenefitsMonth
            | Field::StartBenefitsYear
            | Field::EarliestStartMonth
            | Field::EarliestStartYear => FieldKind::Integer,
        }
    }
}

/// A stored answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Yes/no answer
    Flag(bool),
    /// Parsed whole number
    Number(i64),
    /// Text, or raw input that failed to parse for its kind
    Text(String),
    /// Multi-select values
    List(Vec<String>),
}

impl Answer {
    /// Coerce raw form values for a field of the given kind.
    ///
    /// Returns `None` when nothing was entered.
    pub fn coerce(kind: FieldKind, raw: &[String]) -> Option<Self> {
        if kind == FieldKind::List {
            let mut values: Vec<String> = Vec::new();
            for value in raw.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
                if !values.iter().any(|seen| seen == value) {
                    values.push(value.to_string());
                }
            }
            return (!values.is_empty()).then_some(Answer::List(values));
        }

        let value = raw.first().map(|v| v.trim()).filter(|v| !v.is_empty())?;
        let answer = match kind {
            FieldKind::Integer => value
                .parse::<i64>()
                .map(Answer::Number)
                .unwrap_or_else(|_| Answer::Text(value.to_string())),
            FieldKind::Flag => match value.to_ascii_lowercase().as_str() {
                "yes" | "true" => Answer::Flag(true),
                "no" | "false" => Answer::Flag(false),
                _ => Answer::Text(value.to_string()),
            },
            _ => Answer::Text(value.to_string()),
        };
        Some(answer)
    }

    /// JSON form of the answer, as sent to the backend.
    pub fn to_value(&self) -> Value {
        match self {
            Answer::Flag(b) => Value::Bool(*b),
            Answer::Number(n) => Value::from(*n),
            Answer::Text(s) => Value::String(s.clone()),
            Answer::List(items) => Value::from(items.clone()),
        }
    }
}

/// Raw submitted form values, keyed by wire key.
///
/// Repeated keys (checkbox groups) accumulate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, Vec<String>>);

impl FormValues {
    /// Build from decoded `key=value` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in pairs {
            values.entry(key.into()).or_default().push(value.into());
        }
        Self(values)
    }

    /// Values submitted under `key` (empty when absent).
    pub fn get(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Accumulated answers of one proposal draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<Field, Answer>);

impl Answers {
    /// Empty answer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored answer for a field.
    pub fn get(&self, field: Field) -> Option<&Answer> {
        self.0.get(&field)
    }

    /// Store an answer, replacing any previous one.
    pub fn set(&mut self, field: Field, answer: Answer) {
        self.0.insert(field, answer);
    }

    /// Forget an answer.
    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    /// Whether the field has an answer.
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Iterate answers in field order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &Answer)> {
        self.0.iter().map(|(f, a)| (*f, a))
    }

    /// Text value, if the answer is text.
    pub fn text(&self, field: Field) -> Option<&str> {
        match self.get(field) {
            Some(Answer::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric value, if the answer parsed as a number.
    pub fn number(&self, field: Field) -> Option<i64> {
        match self.get(field) {
            Some(Answer::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Yes/no value, if the answer parsed as a flag.
    pub fn flag(&self, field: Field) -> Option<bool> {
        match self.get(field) {
            Some(Answer::Flag(b)) => Some(*b),
            _ => None,
        }
    }

    /// List value; a single text answer counts as a one-element list.
    pub fn list(&self, field: Field) -> Vec<String> {
        match self.get(field) {
            Some(Answer::List(items)) => items.clone(),
            Some(Answer::Text(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Month/year pair, when both halves are present and the month is valid.
    pub fn month_year(&self, month: Field, year: Field) -> Option<MonthYear> {
        let month = u32::try_from(self.number(month)?).ok()?;
        let year = i32::try_from(self.number(year)?).ok()?;
        MonthYear::new(month, year)
    }

    /// Selected project type, if a known code was chosen.
    pub fn project_type(&self) -> Option<ProjectType> {
        self.text(Field::ProjectType).and_then(ProjectType::from_code)
    }

    /// Selected intervention types; unknown codes are skipped.
    pub fn intervention_types(&self) -> Vec<InterventionType> {
        self.list(Field::InterventionTypes)
            .iter()
            .filter_map(|code| InterventionType::from_code(code))
            .collect()
    }

    /// Selected urgency reason, if a known code was chosen.
    pub fn urgency_reason(&self) -> Option<UrgencyReason> {
        self.text(Field::UrgencyReason).and_then(UrgencyReason::from_code)
    }

    /// Merge a submitted form into the draft.
    ///
    /// Only `owned` fields are written. An owned field missing from the form
    /// is cleared, so unticking every checkbox really empties the list.
    pub fn merge_form(&mut self, owned: &[Field], form: &FormValues) {
        for field in owned {
            if *field == Field::ReferenceNumber {
                continue;
            }
            match Answer::coerce(field.kind(), form.get(field.key())) {
                Some(answer) => self.set(*field, answer),
                None => self.clear(*field),
            }
        }
    }
}
