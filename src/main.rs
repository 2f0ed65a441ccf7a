//! Amortization Schedule CLI
//!
//! Loads a loan definition from JSON, prints a preview and summary, and
//! writes the full schedule to CSV

use amortization_schedule::loan::load_loan;
use amortization_schedule::output::{parse_date_format, render_table, write_csv_file, DEFAULT_DATE_FORMAT};
use amortization_schedule::schedule::{ExtraPaymentAnchoring, ExtraPaymentTiming};
use amortization_schedule::{AmortizationEngine, OutputColumn, ScheduleConfig};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;

/// Generate a loan amortization schedule from a JSON loan definition
#[derive(Parser)]
#[command(name = "amortize", version, about)]
struct Cli {
    /// Loan definition JSON file
    loan: PathBuf,

    /// Where to write the CSV schedule
    #[arg(long, default_value = "amortization_schedule.csv")]
    csv: PathBuf,

    /// Skip writing the CSV file
    #[arg(long)]
    no_csv: bool,

    /// Number of periods to print to the console
    #[arg(long, default_value_t = 24)]
    preview: usize,

    /// When extra payments reduce the balance
    #[arg(long, value_enum, default_value = "end")]
    timing: TimingArg,

    /// How extra payments are assigned to periods
    #[arg(long, value_enum, default_value = "date-range")]
    anchoring: AnchoringArg,

    /// chrono format string for payment dates
    #[arg(long, default_value = DEFAULT_DATE_FORMAT, value_parser = parse_date_format)]
    date_format: String,

    /// Comma-separated columns (overrides the file's outputColumns)
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<OutputColumn>>,

    /// Print the whole schedule as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TimingArg {
    End,
    Start,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AnchoringArg {
    DateRange,
    MonthIndex,
}

impl Cli {
    fn config(&self) -> ScheduleConfig {
        ScheduleConfig {
            timing: match self.timing {
                TimingArg::End => ExtraPaymentTiming::EndOfPeriod,
                TimingArg::Start => ExtraPaymentTiming::StartOfPeriod,
            },
            anchoring: match self.anchoring {
                AnchoringArg::DateRange => ExtraPaymentAnchoring::DateRange,
                AnchoringArg::MonthIndex => ExtraPaymentAnchoring::MonthIndex,
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let loan_file = load_loan(&cli.loan)
        .with_context(|| format!("failed to load loan definition from {}", cli.loan.display()))?;
    let loan = &loan_file.loan;

    let engine = AmortizationEngine::new(cli.config());
    let schedule = engine.schedule_loan(loan).context("failed to generate schedule")?;
    info!("generated {} periods for {}", schedule.rows.len(), cli.loan.display());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        let table_columns = cli
            .columns
            .clone()
            .or_else(|| loan_file.output_columns.clone())
            .unwrap_or_else(|| OutputColumn::ALL.to_vec());

        println!("Loan: ${:.2} at {}% for {} months", loan.principal, loan.annual_rate_percent, loan.term_months);
        println!("  Start Date: {}", loan.start_date.format(&cli.date_format));
        println!("  First Payment: {}", loan.first_payment_date.format(&cli.date_format));
        println!("  Extra Payment Rules: {}", loan.extra_payments.len());
        println!();
        let table = render_table(&schedule.rows, &table_columns, &cli.date_format, Some(cli.preview))
            .with_context(|| format!("failed to format dates with '{}'", cli.date_format))?;
        print!("{}", table);

        let summary = schedule.summary();
        println!("\nSummary:");
        println!("  Level Payment: ${:.2}", summary.level_payment);
        println!("  Total Paid: ${:.2}", summary.total_paid);
        println!("  Total Interest: ${:.2}", summary.total_interest);
        println!("  Total Extra: ${:.2}", summary.total_extra);
        println!("  Payments Made: {}", summary.payments_made);
        match (summary.payoff_period, summary.payoff_date) {
            (Some(period), Some(date)) => {
                println!("  Paid Off: period {} ({})", period, date.format(&cli.date_format))
            }
            _ => println!("  Final Balance: ${:.2}", summary.final_balance),
        }
        if !schedule.unapplied_events.is_empty() {
            println!("  Unapplied Extra Payments: {}", schedule.unapplied_events.len());
        }
    }

    if !cli.no_csv {
        let csv_columns = cli
            .columns
            .clone()
            .or_else(|| loan_file.output_columns.clone())
            .unwrap_or_else(|| OutputColumn::CSV_DEFAULT.to_vec());

        write_csv_file(&cli.csv, &schedule.rows, &csv_columns, &cli.date_format)
            .with_context(|| format!("failed to write {}", cli.csv.display()))?;
        if !cli.json {
            println!("\nFull schedule written to: {}", cli.csv.display());
        }
    }

    Ok(())
}
