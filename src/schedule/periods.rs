//! Billing period partitioning

use super::calendar::{add_days, add_months, sub_days};
use crate::error::ScheduleError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive date range covered by one billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Build the stub period plus `term_months` monthly periods
///
/// Period 0 is `[loan_start, first_payment]`. Period k starts the day after
/// period k-1 ends and ends the day before `first_payment + k months`.
pub fn partition(
    loan_start: NaiveDate,
    first_payment: NaiveDate,
    term_months: u32,
) -> Result<Vec<Period>, ScheduleError> {
    if first_payment < loan_start {
        return Err(ScheduleError::date_range(format!(
            "first payment date {} precedes loan start date {}",
            first_payment, loan_start
        )));
    }

    let mut periods = Vec::with_capacity(term_months as usize + 1);
    periods.push(Period { start: loan_start, end: first_payment });

    for k in 1..=term_months {
        let start = add_days(periods[k as usize - 1].end, 1)?;
        let end = sub_days(add_months(first_payment, k)?, 1)?;
        periods.push(Period { start, end });
    }

    Ok(periods)
}
