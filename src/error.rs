//! Error types for schedule generation

use thiserror::Error;

/// Failures raised by the schedule engine
///
/// Every variant carries enough context (field name or rule index) for the
/// caller to correct the input. No partial schedule is ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// Malformed extra-payment rule (index is the rule's 0-based position)
    #[error("invalid extra payment rule at index {index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    /// Dates that cannot form a valid period sequence
    #[error("invalid date range: {reason}")]
    InvalidDateRange { reason: String },

    /// Non-positive principal/term or negative rate
    #[error("invalid loan {field}: {reason}")]
    InvalidLoan { field: &'static str, reason: String },
}

impl ScheduleError {
    pub fn rule(index: usize, reason: impl Into<String>) -> Self {
        ScheduleError::InvalidRule { index, reason: reason.into() }
    }

    pub fn date_range(reason: impl Into<String>) -> Self {
        ScheduleError::InvalidDateRange { reason: reason.into() }
    }

    pub fn loan(field: &'static str, reason: impl Into<String>) -> Self {
        ScheduleError::InvalidLoan { field, reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_input() {
        let err = ScheduleError::rule(2, "amount must be positive, got -5");
        assert_eq!(
            err.to_string(),
            "invalid extra payment rule at index 2: amount must be positive, got -5"
        );

        let err = ScheduleError::loan("principal", "must be positive, got 0");
        assert_eq!(err.to_string(), "invalid loan principal: must be positive, got 0");
    }
}
