//! Structured trace records for schedule generation
//!
//! The engine reports notable steps to a caller-supplied sink. Passing
//! `&mut NoTrace` discards them; a `Vec<TraceEvent>` collects them.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TraceEvent {
    /// A rule expanded into `events` dated occurrences
    RuleExpanded { index: usize, events: usize },
    /// A recurring rule whose `thru` precedes `begin`
    EmptyRecurringRule { index: usize, begin: NaiveDate, thru: NaiveDate },
    /// Stub plus amortized periods were built
    PeriodsBuilt { count: usize, first: NaiveDate, last: NaiveDate },
    /// Level payment fixed before extras
    LevelPayment { payment: f64, periodic_rate: f64 },
    /// An event fell outside every amortized period
    EventUnapplied { date: NaiveDate, amount: f64 },
    /// Balance reached zero at this period
    PaidOff { period: u32, date: NaiveDate },
}

pub trait TraceSink {
    fn record(&mut self, event: TraceEvent);
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTrace;

impl TraceSink for NoTrace {
    fn record(&mut self, _event: TraceEvent) {}
}

impl TraceSink for Vec<TraceEvent> {
    fn record(&mut self, event: TraceEvent) {
        self.push(event);
    }
}
