//! Month/year and fiscal-year arithmetic
//!
//! Milestones compare lexicographically on (year, month); there is no
//! day-level precision. Financial years begin in April.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Earliest year accepted for any year field.
pub const MIN_YEAR: i64 = 2000;

/// Latest year accepted for any year field.
pub const MAX_YEAR: i64 = 2100;

/// Month in which a financial year starts.
pub const FISCAL_YEAR_START_MONTH: u32 = 4;

/// A calendar month of a year.
///
/// Field order makes the derived `Ord` compare year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthYear {
    /// Calendar year
    pub year: i32,
    /// Month, 1..=12
    pub month: u32,
}

impl MonthYear {
    /// Build a month/year; `None` when the month is out of range.
    pub fn new(month: u32, year: i32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Month/year containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Financial year containing `today`, named by its starting calendar year.
pub fn current_fiscal_year(today: NaiveDate) -> i32 {
    if today.month() >= FISCAL_YEAR_START_MONTH {
        today.year()
    } else {
        today.year() - 1
    }
}

/// Whether a year lies in the accepted range (inclusive).
pub fn year_in_range(year: i64) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

/// Why a milestone date was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceViolation {
    /// Earlier than the current month
    BeforeCurrentMonth,
    /// Same as or earlier than the preceding milestone
    NotAfterPrevious,
}

/// Check a milestone against today and the preceding milestone.
///
/// The previous-milestone rule only applies when `previous` is known.
/// Equality with the previous milestone is a violation.
pub fn check_milestone(
    value: MonthYear,
    today: NaiveDate,
    previous: Option<MonthYear>,
) -> Result<(), SequenceViolation> {
    if value < MonthYear::of(today) {
        return Err(SequenceViolation::BeforeCurrentMonth);
    }
    match previous {
        Some(previous) if value <= previous => Err(SequenceViolation::NotAfterPrevious),
        _ => Ok(()),
    }
}

/// Why a financial year was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiscalYearViolation {
    /// Outside `MIN_YEAR..=MAX_YEAR`
    OutOfRange,
    /// Earlier than the financial year containing today
    BeforeCurrentFiscalYear,
}

/// Check a financial year against the accepted range and today.
pub fn check_financial_year(year: i64, today: NaiveDate) -> Result<(), FiscalYearViolation> {
    if !year_in_range(year) {
        return Err(FiscalYearViolation::OutOfRange);
    }
    if year < i64::from(current_fiscal_year(today)) {
        return Err(FiscalYearViolation::BeforeCurrentFiscalYear);
    }
    Ok(())
}
