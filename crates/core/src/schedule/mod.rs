//! Business-day and settlement-date calculations.
//!
//! Settlement dates quoted to customers must skip weekends and bank
//! holidays. All functions here are pure: given the same holiday
//! calendar and start date they always return the same result.

pub mod busday;

pub use busday::{HolidayCalendar, business_days_between, is_business_day, next_business_day};

#[cfg(test)]
mod busday_props;
