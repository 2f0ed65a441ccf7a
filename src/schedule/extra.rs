//! Expansion of extra-payment rules into dated events

use super::trace::{NoTrace, TraceEvent, TraceSink};
use crate::error::ScheduleError;
use crate::loan::{ExtraPaymentKind, ExtraPaymentRule};
use chrono::{Months, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

/// One discrete extra payment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtraPaymentEvent {
    pub amount: f64,
    pub date: NaiveDate,

    /// Index of the rule that produced this event
    pub rule_index: usize,
}

/// Expand rules into events, in rule order then date order
///
/// Coinciding dates from different rules are kept as separate events.
pub fn expand(rules: &[ExtraPaymentRule]) -> Result<Vec<ExtraPaymentEvent>, ScheduleError> {
    expand_traced(rules, &mut NoTrace)
}

pub fn expand_traced(
    rules: &[ExtraPaymentRule],
    trace: &mut dyn TraceSink,
) -> Result<Vec<ExtraPaymentEvent>, ScheduleError> {
    let mut events = Vec::new();

    for (index, rule) in rules.iter().enumerate() {
        if !rule.amount.is_finite() || rule.amount <= 0.0 {
            return Err(ScheduleError::rule(index, format!("amount must be positive, got {}", rule.amount)));
        }

        let before = events.len();
        match rule.kind {
            ExtraPaymentKind::OneTime => {
                let when = rule
                    .when
                    .ok_or_else(|| ScheduleError::rule(index, "one-time payment is missing 'when'"))?;
                events.push(ExtraPaymentEvent { amount: rule.amount, date: when, rule_index: index });
            }
            ExtraPaymentKind::RecurringMonthly | ExtraPaymentKind::RecurringYearly => {
                let begin = rule.begin.ok_or_else(|| {
                    ScheduleError::rule(index, format!("{} payment is missing 'begin'", rule.kind.as_str()))
                })?;
                let thru = rule.thru.ok_or_else(|| {
                    ScheduleError::rule(index, format!("{} payment is missing 'thru'", rule.kind.as_str()))
                })?;

                if thru < begin {
                    debug!("rule {}: thru {} precedes begin {}, no payments", index, thru, begin);
                    trace.record(TraceEvent::EmptyRecurringRule { index, begin, thru });
                    continue;
                }

                let step = rule.kind.step_months();
                let mut occurrence: u32 = 0;
                loop {
                    let offset = occurrence.checked_mul(step).ok_or_else(|| {
                        ScheduleError::rule(index, "recurring payment spans too many occurrences")
                    })?;
                    // Past the calendar's last date means past `thru` too
                    let date = match begin.checked_add_months(Months::new(offset)) {
                        Some(date) if date <= thru => date,
                        _ => break,
                    };
                    events.push(ExtraPaymentEvent { amount: rule.amount, date, rule_index: index });
                    occurrence += 1;
                }
            }
        }

        let produced = events.len() - before;
        debug!("rule {} ({}): {} event(s)", index, rule.kind.as_str(), produced);
        trace.record(TraceEvent::RuleExpanded { index, events: produced });
    }

    Ok(events)
}
