// crates/statemap-core/src/model.rs

//! Per-state records keyed by canonical state name, and the value slices
//! handed to the renderer.

use crate::aggregate::{self, AggregateReport, Combine, TimeSeries};
use crate::config::Columns;
use crate::error::{MapError, Result};
use crate::period::{MonthKey, Period};
use crate::states::{Resolved, StateResolver};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// The selectable data types.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cases,
    Deaths,
    Population,
    Vaccination,
}

/// How a metric's values read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricKind {
    Count,
    Percent,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Cases,
        Metric::Deaths,
        Metric::Population,
        Metric::Vaccination,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cases => "cases",
            Metric::Deaths => "deaths",
            Metric::Population => "population",
            Metric::Vaccination => "vaccination",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Vaccination => MetricKind::Percent,
            _ => MetricKind::Count,
        }
    }

    /// Cases and deaths come from dated columns and can be sliced by period.
    pub fn is_time_sliced(&self) -> bool {
        matches!(self, Metric::Cases | Metric::Deaths)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cases" | "confirmed" => Ok(Metric::Cases),
            "deaths" => Ok(Metric::Deaths),
            "population" => Ok(Metric::Population),
            "vaccination" | "vaccinations" => Ok(Metric::Vaccination),
            other => Err(MapError::InvalidSelection(format!("unknown metric '{other}'"))),
        }
    }
}

/// A (data type, time period) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub metric: Metric,
    #[serde(default)]
    pub period: Period,
}

impl Selection {
    pub fn new(metric: Metric, period: Period) -> Self {
        Self { metric, period }
    }

    /// Drops the period for metrics without a time dimension.
    pub fn normalized(self) -> Self {
        if self.metric.is_time_sliced() {
            self
        } else {
            Self {
                metric: self.metric,
                period: Period::Total,
            }
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.metric, self.period)
    }
}

/// One state's value under one selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),
    Zero,
    NoData,
}

impl From<Option<f64>> for Reading {
    fn from(v: Option<f64>) -> Self {
        match v {
            None => Reading::NoData,
            Some(v) if v == 0.0 => Reading::Zero,
            Some(v) => Reading::Value(v),
        }
    }
}

impl Reading {
    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Zero => Some(0.0),
            Reading::NoData => None,
        }
    }
}

/// Everything known about one state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StateRecord {
    pub name: String,
    pub code: String,
    pub series: BTreeMap<Metric, TimeSeries>,
    pub values: BTreeMap<Metric, f64>,
}

impl StateRecord {
    /// The record's value for `selection`, `None` when absent.
    pub fn value(&self, selection: Selection) -> Option<f64> {
        let selection = selection.normalized();
        if selection.metric.is_time_sliced() {
            let series = self.series.get(&selection.metric)?;
            match selection.period {
                Period::Total => Some(series.total()),
                Period::Year { year } => series.year(year),
                Period::Month { year, month } => series.month(MonthKey { year, month }),
            }
        } else {
            self.values.get(&selection.metric).copied()
        }
    }
}

/// Canonical state name → value for the current selection.
#[derive(Debug, Clone, Serialize)]
pub struct ValueSlice {
    pub selection: Selection,
    pub kind: MetricKind,
    pub values: BTreeMap<String, f64>,
}

impl ValueSlice {
    pub fn new(selection: Selection, values: BTreeMap<String, f64>) -> Self {
        Self {
            selection,
            kind: selection.metric.kind(),
            values,
        }
    }

    pub fn reading(&self, name: &str) -> Reading {
        self.values.get(name).copied().into()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Reconciled per-state data for every loaded metric.
#[derive(Debug, Clone)]
pub struct DataMap {
    resolver: StateResolver,
    records: BTreeMap<String, StateRecord>,
    loaded: BTreeSet<Metric>,
    unresolved: BTreeSet<String>,
}

impl DataMap {
    pub fn new(resolver: StateResolver) -> Self {
        Self {
            resolver,
            records: BTreeMap::new(),
            loaded: BTreeSet::new(),
            unresolved: BTreeSet::new(),
        }
    }

    pub fn resolver(&self) -> &StateResolver {
        &self.resolver
    }

    /// Aggregates each present table and reconciles it into records.
    pub fn from_tables(
        resolver: StateResolver,
        columns: &Columns,
        tables: &BTreeMap<Metric, Table>,
    ) -> Self {
        let mut map = Self::new(resolver);
        for (&metric, table) in tables {
            let cols = columns.for_metric(metric);
            let report = if metric.is_time_sliced() {
                let (series, report) = aggregate::time_sliced(table, &cols.state);
                map.add_series(metric, series);
                report
            } else {
                let Some(value_column) = cols.value.as_deref() else {
                    tracing::warn!(%metric, "no value column configured; skipping");
                    continue;
                };
                let (rows, report) = aggregate::value_rows(table, &cols.state, value_column);
                map.add_values(metric, rows, cols.combine);
                report
            };
            log_report(metric, &report);
        }
        map
    }

    fn record_for(&mut self, raw: &str) -> Option<&mut StateRecord> {
        match self.resolver.resolve(raw) {
            Resolved::State(info) => Some(
                self.records
                    .entry(info.name.to_owned())
                    .or_insert_with(|| StateRecord {
                        name: info.name.to_owned(),
                        code: info.code.to_owned(),
                        ..StateRecord::default()
                    }),
            ),
            Resolved::Unknown => {
                if self.unresolved.insert(raw.to_owned()) {
                    tracing::debug!(identifier = raw, "unresolved state identifier");
                }
                None
            }
        }
    }

    /// Adds time series keyed by raw identifiers. Identifiers resolving to
    /// the same state (`CA` and `California`) are merged.
    pub fn add_series(&mut self, metric: Metric, raw: BTreeMap<String, TimeSeries>) {
        self.loaded.insert(metric);
        for (ident, series) in raw {
            if let Some(rec) = self.record_for(&ident) {
                rec.series.entry(metric).or_default().merge(&series);
            }
        }
    }

    /// Adds single values keyed by raw identifiers, merged with `combine`.
    ///
    /// Values are folded in iteration order after resolution, so with
    /// [`Combine::Last`] the final pair for a state wins even when the pairs
    /// use different identifiers for it (`"CA"`, `"California"`). Pass rows
    /// in table order to get "last row in the file wins".
    pub fn add_values(
        &mut self,
        metric: Metric,
        raw: impl IntoIterator<Item = (String, f64)>,
        combine: Combine,
    ) {
        self.loaded.insert(metric);
        for (ident, value) in raw {
            if let Some(rec) = self.record_for(&ident) {
                match combine {
                    Combine::Sum => *rec.values.entry(metric).or_insert(0.0) += value,
                    Combine::Last => {
                        rec.values.insert(metric, value);
                    }
                }
            }
        }
    }

    pub fn is_loaded(&self, metric: Metric) -> bool {
        self.loaded.contains(&metric)
    }

    pub fn loaded(&self) -> impl Iterator<Item = Metric> + '_ {
        self.loaded.iter().copied()
    }

    pub fn record(&self, name: &str) -> Option<&StateRecord> {
        self.records.get(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &StateRecord> {
        self.records.values()
    }

    /// Raw identifiers that matched no state, for diagnostics.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.unresolved.iter().map(String::as_str)
    }

    /// Values of every state that has one for `selection`.
    pub fn slice(&self, selection: Selection) -> Result<ValueSlice> {
        let selection = selection.normalized();
        if !self.is_loaded(selection.metric) {
            return Err(MapError::MetricUnavailable(selection.metric.to_string()));
        }
        let values = self
            .records
            .values()
            .filter_map(|r| r.value(selection).map(|v| (r.name.clone(), v)))
            .collect();
        Ok(ValueSlice::new(selection, values))
    }

    /// Periods present for `metric`: `Total`, then years, then months,
    /// each in chronological order.
    pub fn periods(&self, metric: Metric) -> Vec<Period> {
        let mut out = Vec::new();
        if !self.is_loaded(metric) {
            return out;
        }
        out.push(Period::Total);
        if !metric.is_time_sliced() {
            return out;
        }
        let mut years = BTreeSet::new();
        let mut months = BTreeSet::new();
        for rec in self.records.values() {
            if let Some(series) = rec.series.get(&metric) {
                years.extend(series.yearly.keys().copied());
                months.extend(series.monthly.keys().copied());
            }
        }
        out.extend(years.into_iter().map(Period::year));
        out.extend(months.into_iter().map(|m| Period::month(m.month, m.year)));
        out
    }
}

fn log_report(metric: Metric, report: &AggregateReport) {
    tracing::info!(
        %metric,
        rows = report.rows_used,
        skipped = report.rows_skipped,
        coerced = report.cells_coerced,
        "aggregated dataset"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Totals;
    use crate::period::DateColumn;

    fn series(points: &[(&str, f64)]) -> TimeSeries {
        let mut s = TimeSeries::default();
        for (h, v) in points {
            s.add(DateColumn::parse(h).unwrap(), *v);
        }
        s
    }

    fn sample() -> DataMap {
        let mut map = DataMap::new(StateResolver::default());
        let mut raw = BTreeMap::new();
        raw.insert("CA".to_owned(), series(&[("1/1/21", 100.0), ("1/2/21", 50.0)]));
        raw.insert("California".to_owned(), series(&[("2/1/21", 5.0)]));
        raw.insert("TX".to_owned(), series(&[("12/31/20", 0.0)]));
        raw.insert("Grand Total".to_owned(), series(&[("1/1/21", 9999.0)]));
        map.add_series(Metric::Cases, raw);

        let mut vax = Totals::new();
        vax.insert("New York State".to_owned(), 80.5);
        vax.insert("CA".to_owned(), 0.0);
        map.add_values(Metric::Vaccination, vax, Combine::Last);
        map
    }

    #[test]
    fn reading_is_tri_state() {
        assert_eq!(Reading::from(None), Reading::NoData);
        assert_eq!(Reading::from(Some(0.0)), Reading::Zero);
        assert_eq!(Reading::from(Some(3.0)), Reading::Value(3.0));
        assert_eq!(Reading::Zero.value(), Some(0.0));
        assert_eq!(Reading::NoData.value(), None);
    }

    #[test]
    fn codes_and_names_merge_into_one_record() {
        let map = sample();
        let ca = map.record("California").unwrap();
        assert_eq!(ca.code, "CA");
        let s = Selection::new(Metric::Cases, Period::Total);
        assert_eq!(ca.value(s), Some(155.0));
        assert_eq!(map.unresolved().collect::<Vec<_>>(), vec!["Grand Total"]);
    }

    #[test]
    fn slices_by_period() {
        let map = sample();
        let year = map
            .slice(Selection::new(Metric::Cases, Period::year(2021)))
            .unwrap();
        assert_eq!(year.values["California"], 155.0);
        assert_eq!(year.reading("Texas"), Reading::NoData);

        let month = map
            .slice(Selection::new(Metric::Cases, Period::month(1, 2021)))
            .unwrap();
        assert_eq!(month.values["California"], 150.0);

        let total = map
            .slice(Selection::new(Metric::Cases, Period::Total))
            .unwrap();
        assert_eq!(total.reading("Texas"), Reading::Zero);
        assert_eq!(total.reading("Ohio"), Reading::NoData);
    }

    #[test]
    fn untimed_metrics_ignore_period() {
        let map = sample();
        let slice = map
            .slice(Selection::new(Metric::Vaccination, Period::year(2021)))
            .unwrap();
        assert_eq!(slice.selection.period, Period::Total);
        assert_eq!(slice.kind, MetricKind::Percent);
        assert_eq!(slice.values["New York"], 80.5);
        assert_eq!(slice.reading("California"), Reading::Zero);
    }

    #[test]
    fn last_row_in_table_wins_across_aliases() {
        const DOSES: &str = "Percent of total pop with at least one dose";
        let vax = Table::from_records([
            [("Jurisdiction", "California"), (DOSES, "70")],
            [("Jurisdiction", "CA"), (DOSES, "40")],
        ]);
        let mut tables = BTreeMap::new();
        tables.insert(Metric::Vaccination, vax);
        let map = DataMap::from_tables(StateResolver::default(), &Columns::default(), &tables);
        let slice = map
            .slice(Selection::new(Metric::Vaccination, Period::Total))
            .unwrap();
        assert_eq!(slice.values["California"], 40.0);
    }

    #[test]
    fn unloaded_metric_is_an_error() {
        let err = sample()
            .slice(Selection::new(Metric::Deaths, Period::Total))
            .unwrap_err();
        assert!(matches!(err, MapError::MetricUnavailable(m) if m == "deaths"));
    }

    #[test]
    fn periods_list_years_then_months() {
        let map = sample();
        let periods = map.periods(Metric::Cases);
        assert_eq!(
            periods,
            vec![
                Period::Total,
                Period::year(2020),
                Period::year(2021),
                Period::month(12, 2020),
                Period::month(1, 2021),
                Period::month(2, 2021),
            ]
        );
        assert_eq!(map.periods(Metric::Vaccination), vec![Period::Total]);
        assert!(map.periods(Metric::Deaths).is_empty());
    }

    #[test]
    fn metric_parses_selector_values() {
        assert_eq!("Cases".parse::<Metric>().unwrap(), Metric::Cases);
        assert_eq!("vaccinations".parse::<Metric>().unwrap(), Metric::Vaccination);
        assert!("weather".parse::<Metric>().is_err());
    }
}
