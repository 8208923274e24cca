//! Business-day calendar arithmetic.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::BTreeMap;

/// A pluggable set of bank holidays.
///
/// The holiday set is external data (loaded from configuration or a
/// fixture), never hard-coded into the calendar arithmetic.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: BTreeMap<NaiveDate, String>,
}

impl HolidayCalendar {
    /// Creates an empty calendar (weekends only).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a calendar from unnamed holiday dates.
    #[must_use]
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: dates
                .into_iter()
                .map(|d| (d, "Bank holiday".to_string()))
                .collect(),
        }
    }

    /// Adds a named holiday.
    pub fn add(&mut self, date: NaiveDate, name: impl Into<String>) {
        self.holidays.insert(date, name.into());
    }

    /// Returns true if the date is in the holiday set.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    /// Returns the holiday name for a date, if any.
    #[must_use]
    pub fn holiday_name(&self, date: NaiveDate) -> Option<&str> {
        self.holidays.get(&date).map(String::as_str)
    }
}

/// Returns true if the date is a business day.
///
/// Business days are Monday through Friday, excluding calendar holidays.
#[must_use]
pub fn is_business_day(date: NaiveDate, calendar: &HolidayCalendar) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !calendar.contains(date)
}

/// Advances from `start` by `n` business days.
///
/// Each step moves one calendar day forward, counting only business
/// days, so `next_business_day(friday, 1)` lands on Monday (or later
/// if Monday is a holiday). With `n == 0` the start date is returned
/// unchanged.
#[must_use]
pub fn next_business_day(start: NaiveDate, n: u32, calendar: &HolidayCalendar) -> NaiveDate {
    let mut current = start;
    let mut added = 0;

    while added < n {
        current = current
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX);
        if is_business_day(current, calendar) {
            added += 1;
        }
    }

    current
}

/// Counts business days strictly after `start`, up to and including `end`.
///
/// Returns 0 when `start >= end`.
#[must_use]
pub fn business_days_between(start: NaiveDate, end: NaiveDate, calendar: &HolidayCalendar) -> u32 {
    if start >= end {
        return 0;
    }

    let mut count = 0;
    let mut current = start;

    while current < end {
        current = current
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX);
        if is_business_day(current, calendar) {
            count += 1;
        }
    }

    count
}
