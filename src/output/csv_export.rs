//! CSV export of schedule rows

use super::OutputColumn;
use crate::schedule::ScheduleRow;
use csv::Writer;
use std::io::{self, Write};
use std::path::Path;

/// Write a header plus one record per row
pub fn write_csv<W: Write>(
    writer: W,
    rows: &[ScheduleRow],
    columns: &[OutputColumn],
    date_format: &str,
) -> Result<(), csv::Error> {
    let mut csv_writer = Writer::from_writer(writer);

    csv_writer.write_record(columns.iter().map(|c| c.header()))?;
    for row in rows {
        let record = columns
            .iter()
            .map(|c| c.format(row, date_format))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("invalid date format '{}'", date_format))
            })?;
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the schedule to a CSV file, replacing any existing file
pub fn write_csv_file<P: AsRef<Path>>(
    path: P,
    rows: &[ScheduleRow],
    columns: &[OutputColumn],
    date_format: &str,
) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_csv(file, rows, columns, date_format)
}

/// Render the schedule as CSV text
pub fn schedule_to_csv(
    rows: &[ScheduleRow],
    columns: &[OutputColumn],
    date_format: &str,
) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, rows, columns, date_format)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}
