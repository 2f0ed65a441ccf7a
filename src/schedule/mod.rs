//! Schedule generation: extra-payment expansion, period partitioning and the
//! amortization recurrence

pub mod calendar;
mod engine;
mod extra;
mod periods;
mod rows;
pub mod trace;

pub use engine::{
    level_payment, periodic_rate, AmortizationEngine, ExtraPaymentAnchoring, ExtraPaymentTiming,
    ScheduleConfig,
};
pub use extra::{expand, expand_traced, ExtraPaymentEvent};
pub use periods::{partition, Period};
pub use rows::{AmortizationSchedule, ScheduleRow, ScheduleSummary};
pub use trace::{NoTrace, TraceEvent, TraceSink};
