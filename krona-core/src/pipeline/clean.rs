//! Cell cleaning
//!
//! Order of operations is part of the contract: trim first, then coerce
//! date-like columns (unparseable dates become an explicit missing marker,
//! never a row failure), then drop fully-missing rows, then drop exact
//! duplicates of earlier rows.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::{Cell, RawTable, Table};

/// Date formats accepted for date-like columns, tried in order
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Clean a parsed table into typed cells
///
/// `date_columns` names the headers (post-normalization) whose cells are
/// coerced to dates. `date_format`, when given, is tried before the
/// built-in formats.
pub fn clean(table: &RawTable, date_columns: &[&str], date_format: Option<&str>) -> Table {
    let date_indices: Vec<bool> = table
        .headers
        .iter()
        .map(|h| date_columns.contains(&h.as_str()))
        .collect();

    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(table.rows.len());
    for raw_row in &table.rows {
        let row: Vec<Cell> = raw_row
            .iter()
            .zip(&date_indices)
            .map(|(raw, is_date)| {
                let trimmed = raw.trim();
                if *is_date {
                    match parse_date(trimmed, date_format) {
                        Some(date) => Cell::Date(date),
                        None => {
                            if !trimmed.is_empty() {
                                warn!(value = trimmed, "unparseable date coerced to missing");
                            }
                            Cell::Missing
                        }
                    }
                } else {
                    Cell::from_trimmed(trimmed)
                }
            })
            .collect();
        rows.push(row);
    }

    let before = rows.len();
    rows.retain(|row| !row.iter().all(Cell::is_missing));
    let dropped_empty = before - rows.len();

    let mut seen: HashSet<Vec<Cell>> = HashSet::with_capacity(rows.len());
    let before = rows.len();
    rows.retain(|row| seen.insert(row.clone()));
    let dropped_duplicates = before - rows.len();

    if dropped_empty + dropped_duplicates > 0 {
        info!(dropped_empty, dropped_duplicates, "cleaning dropped rows");
    }

    Table {
        headers: table.headers.clone(),
        rows,
    }
}

/// Parse one date cell; `None` marks it missing
fn parse_date(value: &str, date_format: Option<&str>) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    if let Some(fmt) = date_format {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date);
        }
    }
    None
}
