//! Core amortization engine for monthly schedule generation

use super::calendar::{add_days, add_months, month_offset};
use super::extra::{expand_traced, ExtraPaymentEvent};
use super::periods::{partition, Period};
use super::rows::{AmortizationSchedule, ScheduleRow};
use super::trace::{NoTrace, TraceEvent, TraceSink};
use crate::error::ScheduleError;
use crate::loan::LoanDefinition;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Residual balances below `principal * PAID_OFF_TOLERANCE` count as paid off
const PAID_OFF_TOLERANCE: f64 = 1e-9;

/// When an extra payment reduces the balance relative to interest accrual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtraPaymentTiming {
    /// Interest accrues on the opening balance, then extra and principal are
    /// taken out. The lower balance drives the next period's interest.
    #[default]
    EndOfPeriod,
    /// Extra comes off the opening balance before this period's interest
    StartOfPeriod,
}

/// How extra-payment events are assigned to periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtraPaymentAnchoring {
    /// Event belongs to the period whose `[start, end]` contains its date.
    /// Stub-period events are credited to period 1.
    #[default]
    DateRange,
    /// Event belongs to period `months(first payment -> event) + 1`, ignoring
    /// the day of month
    MonthIndex,
}

/// Configuration for a schedule run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub timing: ExtraPaymentTiming,
    pub anchoring: ExtraPaymentAnchoring,
}

/// Monthly rate as a decimal from an annual percentage
pub fn periodic_rate(annual_rate_percent: f64) -> f64 {
    (annual_rate_percent / 100.0) / 12.0
}

/// Standard annuity payment; `principal / term` when the rate is zero
pub fn level_payment(principal: f64, rate: f64, term_months: u32) -> f64 {
    let n = term_months as f64;
    if rate > 0.0 {
        // 1 - (1 + r)^-n, kept accurate for tiny r
        let denominator = -(-n * rate.ln_1p()).exp_m1();
        if denominator > 0.0 {
            return principal * rate / denominator;
        }
    }
    principal / n
}

/// Main schedule engine
#[derive(Debug, Clone, Default)]
pub struct AmortizationEngine {
    config: ScheduleConfig,
}

impl AmortizationEngine {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Expand extras, partition periods and generate the schedule for a loan
    pub fn schedule_loan(&self, loan: &LoanDefinition) -> Result<AmortizationSchedule, ScheduleError> {
        self.schedule_loan_traced(loan, &mut NoTrace)
    }

    pub fn schedule_loan_traced(
        &self,
        loan: &LoanDefinition,
        trace: &mut dyn TraceSink,
    ) -> Result<AmortizationSchedule, ScheduleError> {
        validate_loan(loan.principal, loan.annual_rate_percent, loan.term_months)?;

        let events = expand_traced(&loan.extra_payments, trace)?;
        let periods = partition(loan.start_date, loan.first_payment_date, loan.term_months)?;
        if let (Some(first), Some(last)) = (periods.first(), periods.last()) {
            trace.record(TraceEvent::PeriodsBuilt { count: periods.len(), first: first.start, last: last.end });
        }

        self.generate_traced(
            loan.principal,
            loan.annual_rate_percent,
            loan.term_months,
            &periods,
            &events,
            trace,
        )
    }

    /// Run the recurrence over `periods` (stub first, then `term_months` periods)
    ///
    /// `periods` must be contiguous, each starting the day after the previous
    /// one ends, as built by `partition`.
    pub fn generate(
        &self,
        principal: f64,
        annual_rate_percent: f64,
        term_months: u32,
        periods: &[Period],
        events: &[ExtraPaymentEvent],
    ) -> Result<AmortizationSchedule, ScheduleError> {
        self.generate_traced(principal, annual_rate_percent, term_months, periods, events, &mut NoTrace)
    }

    pub fn generate_traced(
        &self,
        principal: f64,
        annual_rate_percent: f64,
        term_months: u32,
        periods: &[Period],
        events: &[ExtraPaymentEvent],
        trace: &mut dyn TraceSink,
    ) -> Result<AmortizationSchedule, ScheduleError> {
        validate_loan(principal, annual_rate_percent, term_months)?;
        if periods.len() != term_months as usize + 1 {
            return Err(ScheduleError::date_range(format!(
                "expected {} periods (stub + term), got {}",
                term_months as usize + 1,
                periods.len()
            )));
        }
        check_contiguous(periods)?;

        let rate = periodic_rate(annual_rate_percent);
        let payment = level_payment(principal, rate, term_months);
        trace.record(TraceEvent::LevelPayment { payment, periodic_rate: rate });
        debug!("level payment {:.6} at periodic rate {:.8}", payment, rate);

        let (mut buckets, mut unapplied) = self.assign_events(periods, events);
        let first_payment = periods[0].end;
        let tolerance = principal * PAID_OFF_TOLERANCE;

        let mut rows = Vec::with_capacity(term_months as usize);
        let mut balance = principal;

        for period in 1..=term_months {
            let payment_date = add_months(first_payment, period - 1)?;
            let credited = std::mem::take(&mut buckets[period as usize]);

            if balance <= 0.0 {
                // Early payoff: nothing left to apply extras against
                unapplied.extend(credited);
                rows.push(ScheduleRow::new(period, payment_date));
                continue;
            }

            let mut row = ScheduleRow::new(period, payment_date);
            row.extra_payments = credited;
            let extra: f64 = row.extra_payments.iter().map(|e| e.amount).sum();

            self.apply_payment(&mut row, balance, payment, rate, extra);

            if row.balance <= tolerance {
                // Fold float residue into the final principal
                row.principal += row.balance;
                row.payment += row.balance;
                row.balance = 0.0;
                debug!("paid off in period {} ({})", period, payment_date);
                trace.record(TraceEvent::PaidOff { period, date: payment_date });
            }
            if row.extra + 1e-9 < extra {
                warn!(
                    "period {}: extra payments of {:.2} exceed the balance, {:.2} applied",
                    period, extra, row.extra
                );
            }

            balance = row.balance;
            rows.push(row);
        }

        for event in &unapplied {
            warn!(
                "extra payment of {:.2} on {} (rule {}) was not applied: outside the term or after payoff",
                event.amount, event.date, event.rule_index
            );
            trace.record(TraceEvent::EventUnapplied { date: event.date, amount: event.amount });
        }

        Ok(AmortizationSchedule {
            principal,
            periodic_rate: rate,
            level_payment: payment,
            stub: periods[0],
            rows,
            unapplied_events: unapplied,
        })
    }

    /// Regular payment plus extras for one period, balance floored at zero
    fn apply_payment(&self, row: &mut ScheduleRow, opening: f64, payment: f64, rate: f64, extra: f64) {
        let (interest, extra_applied, principal) = match self.config.timing {
            ExtraPaymentTiming::EndOfPeriod => {
                let interest = opening * rate;
                let extra_applied = extra.min(opening);
                let principal = (payment - interest).max(0.0).min(opening - extra_applied);
                (interest, extra_applied, principal)
            }
            ExtraPaymentTiming::StartOfPeriod => {
                let extra_applied = extra.min(opening);
                let reduced = opening - extra_applied;
                let interest = reduced * rate;
                let principal = (payment - interest).max(0.0).min(reduced);
                (interest, extra_applied, principal)
            }
        };

        row.interest = interest;
        row.extra = extra_applied;
        row.principal = principal;
        row.payment = interest + principal + extra_applied;
        row.balance = (opening - extra_applied - principal).max(0.0);
    }

    /// Bucket events by period index; index 0 is never used for rows
    fn assign_events(
        &self,
        periods: &[Period],
        events: &[ExtraPaymentEvent],
    ) -> (Vec<Vec<ExtraPaymentEvent>>, Vec<ExtraPaymentEvent>) {
        let term = periods.len() - 1;
        let mut buckets = vec![Vec::new(); periods.len()];
        let mut unapplied = Vec::new();

        for event in events {
            let index = match self.config.anchoring {
                ExtraPaymentAnchoring::DateRange => {
                    let i = periods.partition_point(|p| p.end < event.date);
                    (i < periods.len() && periods[i].contains(event.date)).then(|| i.max(1))
                }
                ExtraPaymentAnchoring::MonthIndex => {
                    let offset = month_offset(periods[0].end, event.date) + 1;
                    (event.date >= periods[0].start && offset <= term as i64).then(|| offset.max(1) as usize)
                }
            };

            match index {
                Some(i) => buckets[i].push(*event),
                None => unapplied.push(*event),
            }
        }

        (buckets, unapplied)
    }
}

fn check_contiguous(periods: &[Period]) -> Result<(), ScheduleError> {
    for (i, period) in periods.iter().enumerate() {
        if period.start > period.end {
            return Err(ScheduleError::date_range(format!(
                "period {} ends {} before it starts {}",
                i, period.end, period.start
            )));
        }
        if let Some(next) = periods.get(i + 1) {
            if add_days(period.end, 1)? != next.start {
                return Err(ScheduleError::date_range(format!(
                    "period {} starts {}, expected the day after {}",
                    i + 1,
                    next.start,
                    period.end
                )));
            }
        }
    }
    Ok(())
}

fn validate_loan(principal: f64, annual_rate_percent: f64, term_months: u32) -> Result<(), ScheduleError> {
    if !principal.is_finite() || principal <= 0.0 {
        return Err(ScheduleError::loan("principal", format!("must be positive, got {}", principal)));
    }
    if !annual_rate_percent.is_finite() || annual_rate_percent < 0.0 {
        return Err(ScheduleError::loan(
            "annual rate",
            format!("must be zero or positive, got {}", annual_rate_percent),
        ));
    }
    if term_months == 0 {
        return Err(ScheduleError::loan("term", "must be at least one month"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::ExtraPaymentRule;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn thirty_year_loan() -> LoanDefinition {
        LoanDefinition::new(100_000.0, 6.0, 360, date(2023, 12, 1), date(2024, 1, 1))
    }

    fn run(loan: &LoanDefinition) -> AmortizationSchedule {
        AmortizationEngine::default().schedule_loan(loan).unwrap()
    }

    #[test]
    fn test_thirty_year_first_period() {
        let schedule = run(&thirty_year_loan());
        let first = &schedule.rows[0];

        assert_eq!(schedule.rows.len(), 360);
        assert_abs_diff_eq!(schedule.level_payment, 599.55, epsilon = 0.005);
        assert_abs_diff_eq!(first.interest, 500.00, epsilon = 1e-9);
        assert_abs_diff_eq!(first.principal, 99.55, epsilon = 0.005);
        assert_eq!(first.payment_date, date(2024, 1, 1));
        assert_eq!(schedule.rows[359].payment_date, date(2053, 12, 1));
    }

    #[test]
    fn test_fully_amortizes_without_extras() {
        let schedule = run(&thirty_year_loan());
        let summary = schedule.summary();

        assert_eq!(schedule.rows.last().unwrap().balance, 0.0);
        assert_eq!(summary.payoff_period, Some(360));
        assert_abs_diff_eq!(summary.total_principal, 100_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(summary.total_interest, 599.55 * 360.0 - 100_000.0, epsilon = 2.0);
    }

    #[test]
    fn test_balance_non_increasing_and_non_negative() {
        let loan = thirty_year_loan()
            .with_extra_payment(ExtraPaymentRule::monthly(250.0, date(2024, 1, 1), date(2040, 1, 1)))
            .with_extra_payment(ExtraPaymentRule::yearly(3000.0, date(2024, 6, 30), date(2050, 6, 30)));
        let schedule = run(&loan);

        let mut previous = loan.principal;
        for row in &schedule.rows {
            assert!(row.balance >= 0.0);
            assert!(row.balance <= previous);
            previous = row.balance;
        }
    }

    #[test]
    fn test_one_time_extra_lands_in_second_period() {
        let base = run(&thirty_year_loan());
        let loan = thirty_year_loan().with_extra_payment(ExtraPaymentRule::one_time(5000.0, date(2024, 2, 15)));
        let with_extra = run(&loan);

        assert_eq!(with_extra.rows[1].extra, 5000.0);
        assert_eq!(with_extra.rows[1].extra_payments.len(), 1);
        assert_eq!(with_extra.rows[0].extra, 0.0);

        // Period 2 interest is unchanged, period 3 accrues on 5000 less
        assert_abs_diff_eq!(with_extra.rows[1].interest, base.rows[1].interest, epsilon = 1e-9);
        assert_abs_diff_eq!(base.rows[2].interest - with_extra.rows[2].interest, 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_start_of_period_timing() {
        let loan = thirty_year_loan().with_extra_payment(ExtraPaymentRule::one_time(5000.0, date(2024, 2, 15)));
        let engine = AmortizationEngine::new(ScheduleConfig {
            timing: ExtraPaymentTiming::StartOfPeriod,
            ..Default::default()
        });
        let schedule = engine.schedule_loan(&loan).unwrap();
        let base = run(&thirty_year_loan());

        assert_abs_diff_eq!(base.rows[1].interest - schedule.rows[1].interest, 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_principal_plus_extra_equals_loan_amount() {
        let loan = thirty_year_loan()
            .with_extra_payment(ExtraPaymentRule::monthly(400.0, date(2024, 1, 1), date(2060, 1, 1)));
        let schedule = run(&loan);
        let summary = schedule.summary();

        assert_abs_diff_eq!(summary.total_principal + summary.total_extra, 100_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_early_payoff_reports_zero_rows() {
        let loan = LoanDefinition::new(10_000.0, 5.0, 24, date(2024, 1, 1), date(2024, 2, 1))
            .with_extra_payment(ExtraPaymentRule::one_time(9_000.0, date(2024, 3, 10)));
        let schedule = run(&loan);
        let summary = schedule.summary();

        let payoff = summary.payoff_period.unwrap();
        assert!(payoff < 24);

        let payoff_row = &schedule.rows[payoff as usize - 1];
        assert!(payoff_row.payment > 0.0);
        assert!(payoff_row.payment <= schedule.level_payment + 1e-9);

        for row in &schedule.rows[payoff as usize..] {
            assert_eq!(row.payment, 0.0);
            assert_eq!(row.interest, 0.0);
            assert_eq!(row.principal, 0.0);
            assert_eq!(row.balance, 0.0);
        }
        assert_abs_diff_eq!(summary.total_principal + summary.total_extra, 10_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_extra_larger_than_balance_is_capped() {
        let loan = LoanDefinition::new(1_000.0, 12.0, 12, date(2024, 1, 1), date(2024, 1, 1))
            .with_extra_payment(ExtraPaymentRule::one_time(5_000.0, date(2024, 1, 20)));
        let schedule = run(&loan);
        let first = &schedule.rows[0];

        assert_abs_diff_eq!(first.extra, 1_000.0, epsilon = 1e-9);
        assert_eq!(first.principal, 0.0);
        assert_eq!(first.balance, 0.0);
        assert_abs_diff_eq!(first.payment, 1_010.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let loan = LoanDefinition::new(1_200.0, 0.0, 12, date(2024, 1, 1), date(2024, 2, 1));
        let schedule = run(&loan);

        assert_eq!(schedule.level_payment, 100.0);
        for row in &schedule.rows {
            assert_eq!(row.interest, 0.0);
            assert_abs_diff_eq!(row.principal, 100.0, epsilon = 1e-9);
        }
        assert_eq!(schedule.rows.last().unwrap().balance, 0.0);
    }

    #[test]
    fn test_stub_events_credit_first_period() {
        let loan = LoanDefinition::new(50_000.0, 4.0, 60, date(2024, 1, 10), date(2024, 3, 1))
            .with_extra_payment(ExtraPaymentRule::one_time(700.0, date(2024, 2, 1)))
            .with_extra_payment(ExtraPaymentRule::one_time(300.0, date(2024, 3, 1)));
        let schedule = run(&loan);

        assert_abs_diff_eq!(schedule.rows[0].extra, 1_000.0, epsilon = 1e-9);
        assert!(schedule.unapplied_events.is_empty());
    }

    #[test]
    fn test_events_outside_term_are_unapplied() {
        let loan = LoanDefinition::new(5_000.0, 6.0, 12, date(2024, 1, 1), date(2024, 2, 1))
            .with_extra_payment(ExtraPaymentRule::one_time(100.0, date(2023, 12, 31)))
            .with_extra_payment(ExtraPaymentRule::one_time(100.0, date(2025, 6, 1)));
        let mut trace = Vec::new();
        let schedule = AmortizationEngine::default().schedule_loan_traced(&loan, &mut trace).unwrap();

        assert_eq!(schedule.unapplied_events.len(), 2);
        assert_eq!(schedule.summary().total_extra, 0.0);
        let unapplied = trace.iter().filter(|e| matches!(e, TraceEvent::EventUnapplied { .. })).count();
        assert_eq!(unapplied, 2);
    }

    #[test]
    fn test_month_index_anchoring_ignores_day() {
        // Jan 31 first payment: Feb 28 falls in period 1 by date range but
        // in period 2 by month index
        let loan = LoanDefinition::new(20_000.0, 6.0, 24, date(2024, 1, 1), date(2024, 1, 31))
            .with_extra_payment(ExtraPaymentRule::one_time(500.0, date(2024, 2, 28)));

        let by_range = run(&loan);
        assert_eq!(by_range.rows[0].extra, 500.0);

        let engine = AmortizationEngine::new(ScheduleConfig {
            anchoring: ExtraPaymentAnchoring::MonthIndex,
            ..Default::default()
        });
        let by_index = engine.schedule_loan(&loan).unwrap();
        assert_eq!(by_index.rows[0].extra, 0.0);
        assert_eq!(by_index.rows[1].extra, 500.0);
    }

    #[test]
    fn test_identical_inputs_identical_output() {
        let loan = thirty_year_loan()
            .with_extra_payment(ExtraPaymentRule::yearly(1200.0, date(2024, 1, 1), date(2026, 1, 1)));
        assert_eq!(run(&loan), run(&loan));
    }

    #[test]
    fn test_invalid_loans_rejected() {
        let engine = AmortizationEngine::default();
        let mut loan = thirty_year_loan();
        loan.principal = 0.0;
        assert!(matches!(engine.schedule_loan(&loan), Err(ScheduleError::InvalidLoan { field: "principal", .. })));

        let mut loan = thirty_year_loan();
        loan.term_months = 0;
        assert!(matches!(engine.schedule_loan(&loan), Err(ScheduleError::InvalidLoan { field: "term", .. })));

        let mut loan = thirty_year_loan();
        loan.annual_rate_percent = -1.0;
        assert!(matches!(engine.schedule_loan(&loan), Err(ScheduleError::InvalidLoan { .. })));

        let mut loan = thirty_year_loan();
        loan.first_payment_date = date(2023, 11, 1);
        assert!(matches!(engine.schedule_loan(&loan), Err(ScheduleError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_generate_rejects_wrong_period_count() {
        let periods = partition(date(2024, 1, 1), date(2024, 2, 1), 12).unwrap();
        let err = AmortizationEngine::default()
            .generate(10_000.0, 5.0, 24, &periods, &[])
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_generate_rejects_gaps_and_reordering() {
        let engine = AmortizationEngine::default();
        let mut periods = partition(date(2024, 1, 1), date(2024, 2, 1), 12).unwrap();
        periods.swap(3, 4);
        assert!(matches!(
            engine.generate(10_000.0, 5.0, 12, &periods, &[]),
            Err(ScheduleError::InvalidDateRange { .. })
        ));

        let mut periods = partition(date(2024, 1, 1), date(2024, 2, 1), 12).unwrap();
        periods[5].start = add_days(periods[5].start, 3).unwrap();
        assert!(matches!(
            engine.generate(10_000.0, 5.0, 12, &periods, &[]),
            Err(ScheduleError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_tiny_rate_fully_amortizes() {
        for annual_rate_percent in [1e-10, 1e-9, 1e-8, 1e-7] {
            let loan = LoanDefinition::new(100_000.0, annual_rate_percent, 360, date(2023, 12, 1), date(2024, 1, 1));
            let schedule = run(&loan);
            let summary = schedule.summary();

            assert_abs_diff_eq!(schedule.level_payment, 100_000.0 / 360.0, epsilon = 1e-3);
            assert_eq!(summary.final_balance, 0.0);
            assert_eq!(summary.payoff_period, Some(360));
        }
    }
}
