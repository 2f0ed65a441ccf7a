//! Load loan definitions from JSON
//!
//! Accepts both the camelCase field names used by this crate and the legacy
//! loan-file names (`loanAmount`, `interestRate`, `loanTerm` in years,
//! `loanStartDate`).

use super::{ExtraPaymentKind, ExtraPaymentRule, LoanDefinition};
use crate::output::OutputColumn;
use chrono::{Months, NaiveDate};
use log::{debug, info};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Failures while turning input text into a `LoanDefinition`
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read loan file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed loan JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {field}: {reason}")]
    Field { field: String, reason: String },
}

impl LoadError {
    fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadError::Field { field: field.into(), reason: reason.into() }
    }
}

/// A loaded loan plus the presentation settings stored alongside it
#[derive(Debug, Clone, PartialEq)]
pub struct LoanFile {
    pub loan: LoanDefinition,

    /// Columns requested by the file, if any
    pub output_columns: Option<Vec<OutputColumn>>,
}

/// Term as written in the file: a month count or "N months" / "N years"
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTerm {
    Months(u32),
    Text(String),
}

/// Numbers sometimes arrive quoted
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExtraPayment {
    #[serde(rename = "type")]
    kind: ExtraPaymentKind,
    amount: RawNumber,
    when: Option<String>,
    begin: Option<String>,
    #[serde(alias = "end")]
    thru: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLoan {
    #[serde(alias = "loanAmount")]
    principal: RawNumber,
    #[serde(alias = "interestRate")]
    annual_rate: RawNumber,
    term: Option<RawTerm>,
    /// Legacy field; bare numbers are years
    loan_term: Option<RawTerm>,
    #[serde(alias = "loanStartDate")]
    start_date: String,
    first_payment_date: Option<String>,
    #[serde(default)]
    extra_payments: Vec<RawExtraPayment>,
    output_columns: Option<Vec<String>>,
}

impl RawLoan {
    fn into_loan_file(self) -> Result<LoanFile, LoadError> {
        let principal = parse_number("principal", &self.principal)?;
        let annual_rate_percent = parse_number("annualRate", &self.annual_rate)?;
        let term_months = match (&self.term, &self.loan_term) {
            (Some(RawTerm::Months(months)), _) => *months,
            (Some(RawTerm::Text(text)), _) => parse_term(text)?,
            (None, Some(RawTerm::Months(years))) => years
                .checked_mul(12)
                .ok_or_else(|| LoadError::field("loanTerm", format!("{} years is too long", years)))?,
            (None, Some(RawTerm::Text(text))) => parse_term(text)?,
            (None, None) => return Err(LoadError::field("term", "missing; give 'term' or 'loanTerm'")),
        };

        let start_date = parse_date("startDate", &self.start_date)?;
        let first_payment_date = match &self.first_payment_date {
            Some(text) => parse_date("firstPaymentDate", text)?,
            None => {
                let date = start_date.checked_add_months(Months::new(1)).ok_or_else(|| {
                    LoadError::field("startDate", "no valid date one month after start")
                })?;
                info!("firstPaymentDate not given, using one month after start: {}", date);
                date
            }
        };

        let extra_payments = self
            .extra_payments
            .iter()
            .enumerate()
            .map(|(i, raw)| raw.to_rule(i))
            .collect::<Result<Vec<_>, _>>()?;

        let output_columns = match &self.output_columns {
            Some(names) => Some(
                names
                    .iter()
                    .map(|name| {
                        name.parse::<OutputColumn>()
                            .map_err(|reason| LoadError::field("outputColumns", reason))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        debug!(
            "loaded loan: principal={} rate={}% term={} months, {} extra payment rule(s)",
            principal,
            annual_rate_percent,
            term_months,
            extra_payments.len()
        );

        Ok(LoanFile {
            loan: LoanDefinition {
                principal,
                annual_rate_percent,
                term_months,
                start_date,
                first_payment_date,
                extra_payments,
            },
            output_columns,
        })
    }
}

impl RawExtraPayment {
    fn to_rule(&self, index: usize) -> Result<ExtraPaymentRule, LoadError> {
        let field = |name: &str| format!("extraPayments[{}].{}", index, name);
        let optional_date = |name: &str, value: &Option<String>| -> Result<Option<NaiveDate>, LoadError> {
            value.as_deref().map(|text| parse_date(&field(name), text)).transpose()
        };

        Ok(ExtraPaymentRule {
            amount: parse_number(&field("amount"), &self.amount)?,
            kind: self.kind,
            when: optional_date("when", &self.when)?,
            begin: optional_date("begin", &self.begin)?,
            thru: optional_date("thru", &self.thru)?,
        })
    }
}

fn parse_number(field: &str, raw: &RawNumber) -> Result<f64, LoadError> {
    let value = match raw {
        RawNumber::Number(value) => *value,
        RawNumber::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| LoadError::field(field, format!("'{}' is not a number", text)))?,
    };
    if !value.is_finite() {
        return Err(LoadError::field(field, "must be a finite number"));
    }
    Ok(value)
}

/// Parse a date written as `YYYY-MM-DD` or `YYYY-MM` (day 1)
pub fn parse_date(field: &str, text: &str) -> Result<NaiveDate, LoadError> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d"))
        .map_err(|_| LoadError::field(field, format!("'{}' is not a YYYY-MM-DD or YYYY-MM date", text)))
}

/// Resolve "360", "360 months" or "30 years" to a month count
pub fn parse_term(text: &str) -> Result<u32, LoadError> {
    let invalid = || LoadError::field("term", format!("'{}' is not 'N months' or 'N years'", text));
    let mut parts = text.split_whitespace();
    let count: u32 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let multiplier = match parts.next().map(|unit| unit.to_ascii_lowercase()) {
        None => 1,
        Some(unit) if unit == "month" || unit == "months" => 1,
        Some(unit) if unit == "year" || unit == "years" => 12,
        Some(_) => return Err(invalid()),
    };
    if parts.next().is_some() {
        return Err(invalid());
    }
    count.checked_mul(multiplier).ok_or_else(invalid)
}

/// Load a loan definition from a JSON file
pub fn load_loan<P: AsRef<Path>>(path: P) -> Result<LoanFile, LoadError> {
    let file = File::open(path)?;
    load_loan_from_reader(BufReader::new(file))
}

/// Load a loan definition from any reader (e.g., string buffer, stdin)
pub fn load_loan_from_reader<R: Read>(reader: R) -> Result<LoanFile, LoadError> {
    let raw: RawLoan = serde_json::from_reader(reader)?;
    raw.into_loan_file()
}

/// Load a loan definition from JSON text
pub fn load_loan_from_str(text: &str) -> Result<LoanFile, LoadError> {
    let raw: RawLoan = serde_json::from_str(text)?;
    raw.into_loan_file()
}
