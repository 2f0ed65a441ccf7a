//! Schedule output structures

use super::extra::ExtraPaymentEvent;
use super::periods::Period;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single row of the schedule for one amortized period
///
/// Amounts are unrounded; rounding to cents is a presentation concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// Period number (1-indexed)
    pub period: u32,

    /// Nominal payment date (first payment date + period - 1 months)
    pub payment_date: NaiveDate,

    /// Interest + principal + extra actually paid this period
    pub payment: f64,

    /// Regular principal portion
    pub principal: f64,

    /// Interest accrued this period
    pub interest: f64,

    /// Extra payments applied this period
    pub extra: f64,

    /// Remaining balance after this period
    pub balance: f64,

    /// Events credited to this period
    pub extra_payments: Vec<ExtraPaymentEvent>,
}

impl ScheduleRow {
    /// Create a zero row for a period, as reported after payoff
    pub fn new(period: u32, payment_date: NaiveDate) -> Self {
        Self {
            period,
            payment_date,
            payment: 0.0,
            principal: 0.0,
            interest: 0.0,
            extra: 0.0,
            balance: 0.0,
            extra_payments: Vec::new(),
        }
    }

    /// Total reduction of the balance this period
    pub fn principal_reduction(&self) -> f64 {
        self.principal + self.extra
    }
}

/// Complete schedule result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    /// Amount borrowed
    pub principal: f64,

    /// Monthly rate as a decimal
    pub periodic_rate: f64,

    /// Fixed payment before extras
    pub level_payment: f64,

    /// Period 0, from loan start through the first payment
    pub stub: Period,

    /// One row per amortized period
    pub rows: Vec<ScheduleRow>,

    /// Events dated outside every period
    pub unapplied_events: Vec<ExtraPaymentEvent>,
}

impl AmortizationSchedule {
    /// Get summary statistics
    pub fn summary(&self) -> ScheduleSummary {
        let total_interest: f64 = self.rows.iter().map(|r| r.interest).sum();
        let total_principal: f64 = self.rows.iter().map(|r| r.principal).sum();
        let total_extra: f64 = self.rows.iter().map(|r| r.extra).sum();
        let total_paid: f64 = self.rows.iter().map(|r| r.payment).sum();

        let payoff = self.rows.iter().find(|r| r.payment > 0.0 && r.balance <= 0.0);
        let payments_made = self.rows.iter().filter(|r| r.payment > 0.0).count() as u32;

        ScheduleSummary {
            level_payment: self.level_payment,
            total_interest,
            total_principal,
            total_extra,
            total_paid,
            payments_made,
            payoff_period: payoff.map(|r| r.period),
            payoff_date: payoff.map(|r| r.payment_date),
            final_balance: self.rows.last().map(|r| r.balance).unwrap_or(self.principal),
        }
    }
}

/// Summary statistics for a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub level_payment: f64,
    pub total_interest: f64,
    pub total_principal: f64,
    pub total_extra: f64,
    pub total_paid: f64,
    pub payments_made: u32,
    pub payoff_period: Option<u32>,
    pub payoff_date: Option<NaiveDate>,
    pub final_balance: f64,
}
