use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, ParseError};

/// Set of non-working dates excluded from business-day counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    days: HashSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-separated list of `YYYY-MM-DD` dates. Blank entries are skipped.
    pub fn parse_list(list: &str) -> Result<Self, ParseError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .collect()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.days.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl FromIterator<NaiveDate> for HolidayCalendar {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

/// Counts Monday-Friday days in the inclusive range that are not holidays.
/// Reversed bounds are swapped rather than rejected.
pub fn business_days(
    start: NaiveDate,
    end: NaiveDate,
    holidays: Option<&HolidayCalendar>,
) -> u32 {
    let (start, end) = if start > end { (end, start) } else { (start, end) };

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| day.weekday().num_days_from_monday() < 5)
        .filter(|day| !holidays.is_some_and(|h| h.contains(*day)))
        .count() as u32
}
