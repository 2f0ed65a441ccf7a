//! Loan definitions and JSON ingestion

mod data;
pub mod loader;

pub use data::{ExtraPaymentKind, ExtraPaymentRule, LoanDefinition};
pub use loader::{load_loan, load_loan_from_reader, load_loan_from_str, LoadError, LoanFile};
