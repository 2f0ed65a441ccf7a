//! Fixed-width console table

use super::OutputColumn;
use crate::schedule::ScheduleRow;
use std::fmt::{self, Write};

const MIN_WIDTH: usize = 12;

/// Render rows as a right-aligned table, at most `limit` rows if given
pub fn render_table(
    rows: &[ScheduleRow],
    columns: &[OutputColumn],
    date_format: &str,
    limit: Option<usize>,
) -> Result<String, fmt::Error> {
    let shown = limit.map_or(rows.len(), |n| n.min(rows.len()));
    let cells = rows[..shown]
        .iter()
        .map(|row| columns.iter().map(|c| c.format(row, date_format)).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|line| line[i].len())
                .chain([column.header().len(), MIN_WIDTH])
                .max()
                .unwrap_or(MIN_WIDTH)
        })
        .collect();

    let mut out = String::new();
    write!(out, "{:>6}", "Period")?;
    for (column, width) in columns.iter().zip(&widths) {
        write!(out, " {:>width$}", column.header(), width = width)?;
    }
    out.push('\n');
    out.push_str(&"-".repeat(6 + widths.iter().map(|w| w + 1).sum::<usize>()));
    out.push('\n');

    for (row, line) in rows.iter().zip(&cells) {
        write!(out, "{:>6}", row.period)?;
        for (cell, width) in line.iter().zip(&widths) {
            write!(out, " {:>width$}", cell, width = width)?;
        }
        out.push('\n');
    }

    if rows.len() > shown {
        writeln!(out, "... ({} more periods)", rows.len() - shown)?;
    }

    Ok(out)
}
