//! Loan definition and extra-payment rule structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cadence of an extra-payment rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtraPaymentKind {
    /// Single payment on `when`
    #[serde(rename = "one-time")]
    OneTime,
    /// Every calendar month from `begin` through `thru`
    #[serde(rename = "recurring:monthly", alias = "recurring-monthly")]
    RecurringMonthly,
    /// Every calendar year from `begin` through `thru`
    #[serde(rename = "recurring:yearly", alias = "recurring-yearly")]
    RecurringYearly,
}

impl ExtraPaymentKind {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, ExtraPaymentKind::OneTime)
    }

    /// Calendar months between consecutive occurrences (0 for one-time)
    pub fn step_months(&self) -> u32 {
        match self {
            ExtraPaymentKind::OneTime => 0,
            ExtraPaymentKind::RecurringMonthly => 1,
            ExtraPaymentKind::RecurringYearly => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtraPaymentKind::OneTime => "one-time",
            ExtraPaymentKind::RecurringMonthly => "recurring:monthly",
            ExtraPaymentKind::RecurringYearly => "recurring:yearly",
        }
    }
}

/// A declared extra payment, before expansion into dated events
///
/// Dates are optional so that a missing field can be reported with the
/// rule's index instead of failing deserialization wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraPaymentRule {
    /// Amount paid on each occurrence
    pub amount: f64,

    /// One-time or recurring cadence
    pub kind: ExtraPaymentKind,

    /// Payment date for one-time rules
    pub when: Option<NaiveDate>,

    /// First occurrence for recurring rules
    pub begin: Option<NaiveDate>,

    /// Last allowed occurrence for recurring rules (inclusive)
    pub thru: Option<NaiveDate>,
}

impl ExtraPaymentRule {
    pub fn one_time(amount: f64, when: NaiveDate) -> Self {
        Self {
            amount,
            kind: ExtraPaymentKind::OneTime,
            when: Some(when),
            begin: None,
            thru: None,
        }
    }

    pub fn monthly(amount: f64, begin: NaiveDate, thru: NaiveDate) -> Self {
        Self::recurring(ExtraPaymentKind::RecurringMonthly, amount, begin, thru)
    }

    pub fn yearly(amount: f64, begin: NaiveDate, thru: NaiveDate) -> Self {
        Self::recurring(ExtraPaymentKind::RecurringYearly, amount, begin, thru)
    }

    fn recurring(kind: ExtraPaymentKind, amount: f64, begin: NaiveDate, thru: NaiveDate) -> Self {
        Self {
            amount,
            kind,
            when: None,
            begin: Some(begin),
            thru: Some(thru),
        }
    }
}

/// A fully validated loan, ready for schedule generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanDefinition {
    /// Amount borrowed
    pub principal: f64,

    /// Nominal annual interest rate in percent (6.0 = 6%)
    pub annual_rate_percent: f64,

    /// Number of monthly payments
    pub term_months: u32,

    /// Origination date
    pub start_date: NaiveDate,

    /// Date of the first scheduled payment (on or after `start_date`)
    pub first_payment_date: NaiveDate,

    /// Extra payments in declaration order
    pub extra_payments: Vec<ExtraPaymentRule>,
}

impl LoanDefinition {
    /// Create a loan without extra payments
    pub fn new(
        principal: f64,
        annual_rate_percent: f64,
        term_months: u32,
        start_date: NaiveDate,
        first_payment_date: NaiveDate,
    ) -> Self {
        Self {
            principal,
            annual_rate_percent,
            term_months,
            start_date,
            first_payment_date,
            extra_payments: Vec::new(),
        }
    }

    /// Append an extra-payment rule
    pub fn with_extra_payment(mut self, rule: ExtraPaymentRule) -> Self {
        self.extra_payments.push(rule);
        self
    }

    /// Term expressed in whole years (rounded down)
    pub fn term_years(&self) -> u32 {
        self.term_months / 12
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_kind_serde_names() {
        let kind: ExtraPaymentKind = serde_json::from_str("\"recurring:monthly\"").unwrap();
        assert_eq!(kind, ExtraPaymentKind::RecurringMonthly);

        let kind: ExtraPaymentKind = serde_json::from_str("\"recurring-yearly\"").unwrap();
        assert_eq!(kind, ExtraPaymentKind::RecurringYearly);

        assert_eq!(serde_json::to_string(&ExtraPaymentKind::OneTime).unwrap(), "\"one-time\"");
    }

    #[test]
    fn test_builder_keeps_rule_order() {
        let loan = LoanDefinition::new(100_000.0, 6.0, 360, date(2023, 12, 1), date(2024, 1, 1))
            .with_extra_payment(ExtraPaymentRule::one_time(5000.0, date(2024, 2, 15)))
            .with_extra_payment(ExtraPaymentRule::yearly(1200.0, date(2024, 1, 1), date(2026, 1, 1)));

        assert_eq!(loan.extra_payments.len(), 2);
        assert_eq!(loan.extra_payments[0].kind, ExtraPaymentKind::OneTime);
        assert_eq!(loan.extra_payments[1].kind.step_months(), 12);
        assert_eq!(loan.term_years(), 30);
    }
}
