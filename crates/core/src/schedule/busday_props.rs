//! Property-based tests for business-day arithmetic.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use super::busday::{HolidayCalendar, business_days_between, is_business_day, next_business_day};

/// Strategy to generate dates across several years.
fn any_date() -> impl Strategy<Value = NaiveDate> {
    (0u64..1500).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(offset))
            .unwrap()
    })
}

/// Strategy to generate business-day offsets.
fn day_offset() -> impl Strategy<Value = u32> {
    0u32..30
}

/// Strategy to generate a small holiday calendar near the generated dates.
fn calendar() -> impl Strategy<Value = HolidayCalendar> {
    prop::collection::vec((0u64..1600).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(offset))
            .unwrap()
    }), 0..12)
    .prop_map(HolidayCalendar::from_dates)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Advancing by zero from an already-computed business day is stable:
    /// next_business_day(next_business_day(d, n), 0) == next_business_day(d, n).
    #[test]
    fn prop_next_business_day_round_trip(
        start in any_date(),
        n in day_offset(),
        cal in calendar(),
    ) {
        let advanced = next_business_day(start, n, &cal);
        prop_assert_eq!(next_business_day(advanced, 0, &cal), advanced);
    }

    /// Counting back the days that were advanced recovers n:
    /// business_days_between(d, next_business_day(d, n)) == n.
    #[test]
    fn prop_between_inverts_advance(
        start in any_date(),
        n in day_offset(),
        cal in calendar(),
    ) {
        let advanced = next_business_day(start, n, &cal);
        prop_assert_eq!(business_days_between(start, advanced, &cal), n);
    }

    /// Advancing by at least one day always lands on a business day.
    #[test]
    fn prop_advance_lands_on_business_day(
        start in any_date(),
        n in 1u32..30,
        cal in calendar(),
    ) {
        let advanced = next_business_day(start, n, &cal);
        prop_assert!(is_business_day(advanced, &cal));
    }

    /// Advancing is strictly monotonic in n.
    #[test]
    fn prop_advance_is_monotonic(
        start in any_date(),
        n in day_offset(),
        cal in calendar(),
    ) {
        let shorter = next_business_day(start, n, &cal);
        let longer = next_business_day(start, n + 1, &cal);
        prop_assert!(longer > shorter);
    }
}
