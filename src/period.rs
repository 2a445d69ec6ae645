//! Calendar periods and half-open period ranges
//!
//! A [`Period`] is the first day of a calendar month or year, tagged with its
//! [`Granularity`]. A [`PeriodRange`] yields every period from its start up to,
//! but excluding, its end.

use crate::error::PeriodError;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

/// Step unit of a period
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One calendar month
    Month,
    /// One calendar year
    Year,
}

impl Granularity {
    fn months(self) -> Months {
        match self {
            Granularity::Month => Months::new(1),
            Granularity::Year => Months::new(12),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Month => f.write_str("month"),
            Granularity::Year => f.write_str("year"),
        }
    }
}

/// A calendar month or year
///
/// Ordering follows the calendar. Periods are serialized as `YYYY-MM` (month) or
/// `YYYY` (year).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    start: NaiveDate,
    granularity: Granularity,
}

impl Period {
    /// The month `month` (1-12) of `year`
    pub fn month(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::MonthOutOfRange { month });
        }
        let start =
            NaiveDate::from_ymd_opt(year, month, 1).ok_or(PeriodError::YearOutOfRange { year })?;
        Ok(Self {
            start,
            granularity: Granularity::Month,
        })
    }

    /// The calendar year `year`
    pub fn year(year: i32) -> Result<Self, PeriodError> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(PeriodError::YearOutOfRange { year })?;
        Ok(Self {
            start,
            granularity: Granularity::Year,
        })
    }

    /// Parse a `YYYY-MM` month
    pub fn parse_month(input: &str) -> Result<Self, PeriodError> {
        let malformed = || PeriodError::Malformed {
            input: input.to_string(),
            expected: "YYYY-MM",
        };
        let (year, month) = input.split_once('-').ok_or_else(malformed)?;
        if year.len() != 4 || month.len() != 2 || !all_digits(year) || !all_digits(month) {
            return Err(malformed());
        }
        let year = year.parse().map_err(|_| malformed())?;
        let month = month.parse().map_err(|_| malformed())?;
        Self::month(year, month)
    }

    /// Parse a `YYYY` year
    pub fn parse_year(input: &str) -> Result<Self, PeriodError> {
        if input.len() != 4 || !all_digits(input) {
            return Err(PeriodError::Malformed {
                input: input.to_string(),
                expected: "YYYY",
            });
        }
        let year = input.parse().map_err(|_| PeriodError::Malformed {
            input: input.to_string(),
            expected: "YYYY",
        })?;
        Self::year(year)
    }

    /// First day of the period
    pub fn first_day(&self) -> NaiveDate {
        self.start
    }

    /// Granularity of the period
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Calendar year of the period
    pub fn year_number(&self) -> i32 {
        self.start.year()
    }

    /// Calendar month of the period (1 for year periods)
    pub fn month_number(&self) -> u32 {
        self.start.month()
    }

    /// The same point in time at another granularity
    ///
    /// Coarsening to a year drops the month. Refining a year yields its January.
    pub fn truncate(self, granularity: Granularity) -> Self {
        let start = match granularity {
            Granularity::Month => self.start,
            Granularity::Year => self.start.with_month(1).unwrap_or(self.start),
        };
        Self { start, granularity }
    }

    /// The following period, `None` past the end of the supported calendar
    pub fn succ(self) -> Option<Self> {
        self.start
            .checked_add_months(self.granularity.months())
            .map(|start| Self {
                start,
                granularity: self.granularity,
            })
    }

    /// `YYYY-MM`
    pub fn format_month(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }

    /// `DD/MM/YYYY` of the first day
    pub fn format_day_month_year(&self) -> String {
        self.start.format("%d/%m/%Y").to_string()
    }

    /// `YYYY`
    pub fn format_year(&self) -> String {
        self.start.format("%Y").to_string()
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity {
            Granularity::Month => f.write_str(&self.format_month()),
            Granularity::Year => f.write_str(&self.format_year()),
        }
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    /// Accepts `YYYY-MM` for months and `YYYY` for years
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('-') {
            Self::parse_month(s)
        } else {
            Self::parse_year(s)
        }
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

/// Half-open range of periods `[start, end)` stepped at one granularity
///
/// Both bounds are truncated to the range granularity when iterating. A range whose
/// start is not before its end is empty, which is not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    /// First period (inclusive)
    pub start: Period,
    /// End period (exclusive)
    pub end: Period,
    /// Step unit
    pub granularity: Granularity,
}

impl PeriodRange {
    /// Range stepped at `granularity`, bounds truncated to it
    pub fn new(start: Period, end: Period, granularity: Granularity) -> Self {
        Self {
            start: start.truncate(granularity),
            end: end.truncate(granularity),
            granularity,
        }
    }

    /// Monthly range `[start, end)`
    pub fn months(start: Period, end: Period) -> Self {
        Self::new(start, end, Granularity::Month)
    }

    /// Yearly range `[start, end)`
    pub fn years(start: Period, end: Period) -> Self {
        Self::new(start, end, Granularity::Year)
    }

    /// Whether the range yields no periods
    pub fn is_empty(&self) -> bool {
        self.start.truncate(self.granularity) >= self.end.truncate(self.granularity)
    }

    /// A fresh iterator over the range; ranges can be iterated any number of times
    pub fn iter(&self) -> PeriodIter {
        PeriodIter {
            next: Some(self.start.truncate(self.granularity)),
            end: self.end.truncate(self.granularity),
        }
    }
}

impl IntoIterator for PeriodRange {
    type Item = Period;
    type IntoIter = PeriodIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &PeriodRange {
    type Item = Period;
    type IntoIter = PeriodIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over a [`PeriodRange`]
#[derive(Clone, Debug)]
pub struct PeriodIter {
    next: Option<Period>,
    end: Period,
}

impl Iterator for PeriodIter {
    type Item = Period;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|p| *p < self.end)?;
        self.next = current.succ();
        Some(current)
    }
}

impl FusedIterator for PeriodIter {}
