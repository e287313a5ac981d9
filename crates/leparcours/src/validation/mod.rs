//! Step validators
//!
//! A [`Validator`] checks the answers a step owns and returns every
//! field-level problem at once. Validators are pure: the only outside input
//! is the date carried by [`ValidationContext`], read from an injected
//! [`Clock`] once per request.

use chrono::NaiveDate;

use crate::clock::Clock;
use crate::error::ValidationErrors;
use crate::fields::{Answer, Answers, Field};

/// Name, area, type and urgency rules.
pub mod proposal;
/// Financial-year and milestone rules.
pub mod schedule;

pub use proposal::{
    AreaValidator, InterventionTypesValidator, NameValidator, PrimaryInterventionValidator,
    ProjectTypeValidator, UrgencyValidator,
};
pub use schedule::{
    CouldStartEarlyValidator, FinancialEndYearValidator, FinancialStartYearValidator,
    MilestoneValidator,
};

/// Inputs a validator may depend on besides the answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    /// Date the request is being handled on
    pub today: NaiveDate,
}

impl ValidationContext {
    /// Context for a given date
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Context read from a clock
    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self::new(clock.today())
    }
}

/// Field-level validation of a step's answers.
pub trait Validator: Send + Sync {
    /// Check `answers`; `Err` carries every problem found.
    fn validate(&self, answers: &Answers, ctx: &ValidationContext) -> Result<(), ValidationErrors>;
}

/// Text answer that must be present.
pub(crate) fn required_text<'a>(
    answers: &'a Answers,
    field: Field,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    match answers.get(field) {
        None => {
            errors.push(field, "required");
            None
        }
        Some(Answer::Text(text)) => Some(text.as_str()),
        Some(_) => {
            errors.push(field, "invalid");
            None
        }
    }
}

/// Whole-number answer that must be present.
pub(crate) fn required_integer(
    answers: &Answers,
    field: Field,
    errors: &mut ValidationErrors,
) -> Option<i64> {
    match answers.get(field) {
        None => {
            errors.push(field, "required");
            None
        }
        Some(Answer::Number(n)) => Some(*n),
        Some(_) => {
            errors.push(field, "invalid");
            None
        }
    }
}

/// Code answer that must be present and known to `parse`.
pub(crate) fn required_choice<T>(
    answers: &Answers,
    field: Field,
    parse: impl Fn(&str) -> Option<T>,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let code = required_text(answers, field, errors)?;
    let parsed = parse(code);
    if parsed.is_none() {
        errors.push(field, "invalid");
    }
    parsed
}
