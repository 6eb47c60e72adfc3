// crates/statemap-core/src/aggregate.rs

//! # Aggregator
//!
//! Groups table rows by a raw state identifier and sums or extracts one
//! numeric field. Keys here are the identifiers exactly as they appear in the
//! table (`"CA"`, `"New York State"`); reconciliation to canonical names
//! happens in [`crate::model::DataMap`].

use crate::period::{is_date_header, DateColumn, MonthKey};
use crate::table::{Row, Table};
use crate::text::parse_cell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Totals per raw identifier.
pub type Totals = BTreeMap<String, f64>;

/// Month and year buckets for one state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub monthly: BTreeMap<MonthKey, f64>,
    pub yearly: BTreeMap<i32, f64>,
}

impl TimeSeries {
    pub fn add(&mut self, date: DateColumn, value: f64) {
        *self.monthly.entry(date.month_key()).or_insert(0.0) += value;
        *self.yearly.entry(date.year).or_insert(0.0) += value;
    }

    pub fn total(&self) -> f64 {
        self.yearly.values().sum()
    }

    pub fn month(&self, key: MonthKey) -> Option<f64> {
        self.monthly.get(&key).copied()
    }

    pub fn year(&self, year: i32) -> Option<f64> {
        self.yearly.get(&year).copied()
    }

    /// Folds another series into this one bucket by bucket.
    pub fn merge(&mut self, other: &TimeSeries) {
        for (k, v) in &other.monthly {
            *self.monthly.entry(*k).or_insert(0.0) += v;
        }
        for (k, v) in &other.yearly {
            *self.yearly.entry(*k).or_insert(0.0) += v;
        }
    }
}

/// How duplicate rows for one identifier combine in [`single_value`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    /// County-level rows (population).
    #[default]
    Sum,
    /// One row per jurisdiction (vaccination percentages); the row that
    /// comes later in the table wins.
    Last,
}

/// Bookkeeping returned next to every aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub rows_used: usize,
    pub rows_skipped: usize,
    /// Non-empty cells that failed to parse and counted as zero.
    pub cells_coerced: usize,
    /// `M/D/YY`-shaped headers that are not a calendar date (`13/1/20`).
    pub columns_skipped: usize,
}

fn state_of<'a>(row: &Row<'a>, column: &str) -> Option<&'a str> {
    row.get(column).map(str::trim).filter(|s| !s.is_empty())
}

/// Parses one cell, coercing failures to zero.
fn coerce(cell: &str, report: &mut AggregateReport) -> f64 {
    match parse_cell(cell) {
        Some(v) => v,
        None => {
            if !cell.trim().is_empty() {
                report.cells_coerced += 1;
            }
            0.0
        }
    }
}

/// Date columns of `table`, parsed once. Headers shaped like a date that
/// fail to parse are left out and counted in the report.
fn date_columns<'t>(
    table: &'t Table,
    report: &mut AggregateReport,
) -> Vec<(&'t str, DateColumn)> {
    let mut out = Vec::new();
    for h in table.headers().iter().filter(|h| is_date_header(h)) {
        match DateColumn::parse(h) {
            Some(d) => out.push((h.as_str(), d)),
            None => {
                tracing::warn!(header = %h, "ignoring column with invalid date");
                report.columns_skipped += 1;
            }
        }
    }
    out
}

/// Sums every date-named column per identifier.
///
/// Only headers that parse to a calendar date take part, the same set
/// [`time_sliced`] buckets, so a total always equals the sum of its years.
///
/// ```rust
/// use statemap_core::aggregate::sum_dated_columns;
/// use statemap_core::table::Table;
///
/// let t = Table::from_records(vec![
///     vec![("State", "CA"), ("1/1/21", "100"), ("1/2/21", "50")],
///     vec![("State", "CA"), ("1/1/21", "oops"), ("1/2/21", "5")],
/// ]);
/// let (totals, report) = sum_dated_columns(&t, "State");
/// assert_eq!(totals["CA"], 155.0);
/// assert_eq!(report.cells_coerced, 1);
/// ```
pub fn sum_dated_columns(table: &Table, state_column: &str) -> (Totals, AggregateReport) {
    let mut report = AggregateReport::default();
    let dates = date_columns(table, &mut report);
    let mut out = Totals::new();

    for row in table.rows() {
        let Some(state) = state_of(&row, state_column) else {
            report.rows_skipped += 1;
            continue;
        };
        report.rows_used += 1;
        let mut sum = 0.0;
        for (header, _) in &dates {
            if let Some(cell) = row.get(header) {
                sum += coerce(cell, &mut report);
            }
        }
        *out.entry(state.to_owned()).or_insert(0.0) += sum;
    }

    tracing::debug!(
        used = report.rows_used,
        skipped = report.rows_skipped,
        coerced = report.cells_coerced,
        "summed dated columns"
    );
    (out, report)
}

/// Splits date-named columns into month and year buckets per identifier.
pub fn time_sliced(
    table: &Table,
    state_column: &str,
) -> (BTreeMap<String, TimeSeries>, AggregateReport) {
    let mut report = AggregateReport::default();
    let dates = date_columns(table, &mut report);
    let mut out: BTreeMap<String, TimeSeries> = BTreeMap::new();

    for row in table.rows() {
        let Some(state) = state_of(&row, state_column) else {
            report.rows_skipped += 1;
            continue;
        };
        report.rows_used += 1;
        let series = out.entry(state.to_owned()).or_default();
        for (header, date) in &dates {
            if let Some(cell) = row.get(header) {
                series.add(*date, coerce(cell, &mut report));
            }
        }
    }

    tracing::debug!(
        states = out.len(),
        dates = dates.len(),
        skipped = report.rows_skipped,
        "aggregated time series"
    );
    (out, report)
}

/// Reads one named column as `(identifier, value)` pairs in table order.
///
/// Rows without the identifier are skipped. A missing value column yields no
/// pairs rather than a table of zeroes.
pub fn value_rows(
    table: &Table,
    state_column: &str,
    value_column: &str,
) -> (Vec<(String, f64)>, AggregateReport) {
    let mut report = AggregateReport::default();
    let mut out = Vec::new();

    if !table.has_column(value_column) {
        tracing::debug!(column = value_column, "value column missing");
        report.rows_skipped = table.len();
        return (out, report);
    }

    for row in table.rows() {
        let Some(state) = state_of(&row, state_column) else {
            report.rows_skipped += 1;
            continue;
        };
        report.rows_used += 1;
        let value = coerce(row.get(value_column).unwrap_or(""), &mut report);
        out.push((state.to_owned(), value));
    }
    (out, report)
}

/// Reads one named column per identifier, folding duplicates with `combine`.
pub fn single_value(
    table: &Table,
    state_column: &str,
    value_column: &str,
    combine: Combine,
) -> (Totals, AggregateReport) {
    let (rows, report) = value_rows(table, state_column, value_column);
    let mut out = Totals::new();
    for (state, value) in rows {
        match combine {
            Combine::Sum => *out.entry(state).or_insert(0.0) += value,
            Combine::Last => {
                out.insert(state, value);
            }
        }
    }
    (out, report)
}
