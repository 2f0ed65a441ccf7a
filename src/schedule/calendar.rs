//! Calendar-month date arithmetic
//!
//! Dates are always derived from a fixed anchor (`anchor + k months`) rather
//! than by stepping the previous result, so a month-end anchor never drifts:
//! Jan 31 + 1 month is Feb 29 (2024) but Jan 31 + 2 months is Mar 31.

use crate::error::ScheduleError;
use chrono::{Datelike, Days, Months, NaiveDate};

/// `date` shifted forward by `months` calendar months, day clamped to month end
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, ScheduleError> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        ScheduleError::date_range(format!("{} + {} months is outside the supported calendar", date, months))
    })
}

pub fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, ScheduleError> {
    date.checked_add_days(Days::new(days)).ok_or_else(|| {
        ScheduleError::date_range(format!("{} + {} days is outside the supported calendar", date, days))
    })
}

pub fn sub_days(date: NaiveDate, days: u64) -> Result<NaiveDate, ScheduleError> {
    date.checked_sub_days(Days::new(days)).ok_or_else(|| {
        ScheduleError::date_range(format!("{} - {} days is outside the supported calendar", date, days))
    })
}

/// Whole calendar months from `from`'s month to `to`'s month, ignoring days
pub fn month_offset(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + (to.month() as i64 - from.month() as i64)
}
