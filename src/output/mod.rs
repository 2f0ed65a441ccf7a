//! Presentation of schedules: console table and CSV export
//!
//! Rounding to cents and date formatting happen here and nowhere else.

mod csv_export;
mod table;

pub use csv_export::{schedule_to_csv, write_csv, write_csv_file};
pub use table::render_table;

use crate::schedule::ScheduleRow;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

/// Default chrono format for payment dates
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// A selectable schedule column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputColumn {
    PaymentDate,
    PaymentAmount,
    PrincipalPayment,
    InterestPayment,
    ExtraPayment,
    RemainingBalance,
}

impl OutputColumn {
    pub const ALL: [OutputColumn; 6] = [
        OutputColumn::PaymentDate,
        OutputColumn::PaymentAmount,
        OutputColumn::PrincipalPayment,
        OutputColumn::InterestPayment,
        OutputColumn::ExtraPayment,
        OutputColumn::RemainingBalance,
    ];

    /// CSV export columns
    pub const CSV_DEFAULT: [OutputColumn; 5] = [
        OutputColumn::PaymentDate,
        OutputColumn::PaymentAmount,
        OutputColumn::PrincipalPayment,
        OutputColumn::InterestPayment,
        OutputColumn::RemainingBalance,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            OutputColumn::PaymentDate => "Payment Date",
            OutputColumn::PaymentAmount => "Payment Amount",
            OutputColumn::PrincipalPayment => "Principal Payment",
            OutputColumn::InterestPayment => "Interest Payment",
            OutputColumn::ExtraPayment => "Extra Payment",
            OutputColumn::RemainingBalance => "Remaining Balance",
        }
    }

    /// Cell text for a row: amounts to 2 decimals, dates via `date_format`
    ///
    /// Fails when `date_format` holds an unknown specifier.
    pub fn format(&self, row: &ScheduleRow, date_format: &str) -> Result<String, fmt::Error> {
        let text = match self {
            OutputColumn::PaymentDate => {
                let mut text = String::new();
                write!(text, "{}", row.payment_date.format(date_format))?;
                text
            }
            OutputColumn::PaymentAmount => format_amount(row.payment),
            OutputColumn::PrincipalPayment => format_amount(row.principal),
            OutputColumn::InterestPayment => format_amount(row.interest),
            OutputColumn::ExtraPayment => format_amount(row.extra),
            OutputColumn::RemainingBalance => format_amount(row.balance),
        };
        Ok(text)
    }
}

impl fmt::Display for OutputColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for OutputColumn {
    type Err = String;

    /// Accepts "Payment Date", "payment_date", "payment-date" or "paymentDate"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        OutputColumn::ALL
            .into_iter()
            .find(|column| {
                let name: String = column.header().chars().filter(|c| !c.is_whitespace()).collect();
                name.to_ascii_lowercase() == key
            })
            .ok_or_else(|| format!("unknown column '{}'", s))
    }
}

/// Accept a chrono date format only if every specifier in it is known
pub fn parse_date_format(text: &str) -> Result<String, String> {
    if StrftimeItems::new(text).any(|item| matches!(item, Item::Error)) {
        return Err(format!("'{}' is not a valid date format", text));
    }
    Ok(text.to_string())
}

/// Two-decimal rendering; clears the sign of values that round to zero
pub fn format_amount(value: f64) -> String {
    let text = format!("{:.2}", value);
    if text == "-0.00" {
        "0.00".to_string()
    } else {
        text
    }
}
