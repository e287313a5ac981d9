use crate::dates::{
    check_financial_year, check_milestone, year_in_range, FiscalYearViolation, MonthYear,
    SequenceViolation,
};
use crate::error::ValidationErrors;
use crate::fields::{Answer, Answers, Field};

use super::{required_integer, ValidationContext, Validator};

fn check_fiscal(field: Field, year: i64, ctx: &ValidationContext, errors: &mut ValidationErrors) -> bool {
    match check_financial_year(year, ctx.today) {
        Ok(()) => true,
        Err(FiscalYearViolation::OutOfRange) => {
            errors.push(field, "outOfRange");
            false
        }
        Err(FiscalYearViolation::BeforeCurrentFiscalYear) => {
            errors.push(field, "beforeCurrentFiscalYear");
            false
        }
    }
}

/// First financial year: in range, not past, not after the end year.
#[derive(Debug, Default, Clone, Copy)]
pub struct FinancialStartYearValidator;

impl Validator for FinancialStartYearValidator {
    fn validate(&self, answers: &Answers, ctx: &ValidationContext) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(start) = required_integer(answers, Field::FinancialStartYear, &mut errors) {
            if check_fiscal(Field::FinancialStartYear, start, ctx, &mut errors) {
                if let Some(end) = answers.number(Field::FinancialEndYear) {
                    if start > end {
                        errors.push(Field::FinancialStartYear, "afterEndYear");
                    }
                }
            }
        }
        errors.into_result()
    }
}

/// Last financial year: in range, not past, not before the start year.
#[derive(Debug, Default, Clone, Copy)]
pub struct FinancialEndYearValidator;

impl Validator for FinancialEndYearValidator {
    fn validate(&self, answers: &Answers, ctx: &ValidationContext) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(end) = required_integer(answers, Field::FinancialEndYear, &mut errors) {
            if check_fiscal(Field::FinancialEndYear, end, ctx, &mut errors) {
                if let Some(start) = answers.number(Field::FinancialStartYear) {
                    if end < start {
                        errors.push(Field::FinancialEndYear, "beforeStartYear");
                    }
                }
            }
        }
        errors.into_result()
    }
}

/// One (month, year) milestone of the important-dates chain.
///
/// Sequence errors are reported against the month field.
#[derive(Debug, Clone, Copy)]
pub struct MilestoneValidator {
    month: Field,
    year: Field,
    previous: Option<(Field, Field)>,
}

impl MilestoneValidator {
    /// Milestone stored in `month`/`year`, following `previous` if any.
    pub const fn new(month: Field, year: Field, previous: Option<(Field, Field)>) -> Self {
        Self {
            month,
            year,
            previous,
        }
    }
}

impl Validator for MilestoneValidator {
    fn validate(&self, answers: &Answers, ctx: &ValidationContext) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let month = required_integer(answers, self.month, &mut errors).filter(|m| {
            let valid = (1..=12).contains(m);
            if !valid {
                errors.push(self.month, "invalid");
            }
            valid
        });
        let year = required_integer(answers, self.year, &mut errors).filter(|y| {
            let valid = year_in_range(*y);
            if !valid {
                errors.push(self.year, "outOfRange");
            }
            valid
        });

        let value = month
            .zip(year)
            .and_then(|(m, y)| MonthYear::new(u32::try_from(m).ok()?, i32::try_from(y).ok()?));
        if let Some(value) = value {
            let previous = self
                .previous
                .and_then(|(month, year)| answers.month_year(month, year));
            match check_milestone(value, ctx.today, previous) {
                Ok(()) => {}
                Err(SequenceViolation::BeforeCurrentMonth) => {
                    errors.push(self.month, "beforeCurrentMonth")
                }
                Err(SequenceViolation::NotAfterPrevious) => {
                    errors.push(self.month, "notAfterPrevious")
                }
            }
        }
        errors.into_result()
    }
}

/// Could-start-early: a yes/no answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct CouldStartEarlyValidator;

impl Validator for CouldStartEarlyValidator {
    fn validate(&self, answers: &Answers, _ctx: &ValidationContext) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match answers.get(Field::CouldStartEarly) {
            Some(Answer::Flag(_)) => {}
            Some(_) => errors.push(Field::CouldStartEarly, "invalid"),
            None => errors.push(Field::CouldStartEarly, "required"),
        }
        errors.into_result()
    }
}
