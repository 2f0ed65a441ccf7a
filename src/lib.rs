//! Amortization Schedule - loan amortization engine with extra payments
//!
//! This library provides:
//! - Expansion of one-time and recurring extra-payment rules into dated events
//! - Billing period partitioning with an irregular first (stub) period
//! - The level-payment amortization recurrence with early payoff
//! - JSON loan ingestion, console table rendering and CSV export

pub mod error;
pub mod loan;
pub mod output;
pub mod schedule;

// Re-export commonly used types
pub use error::ScheduleError;
pub use loan::{ExtraPaymentKind, ExtraPaymentRule, LoanDefinition};
pub use output::OutputColumn;
pub use schedule::{AmortizationEngine, AmortizationSchedule, ScheduleConfig, ScheduleRow};
