// crates/statemap-core/tests/aggregation_props.rs

use proptest::prelude::*;
use statemap_core::aggregate::{single_value, sum_dated_columns, time_sliced, Combine};
use statemap_core::period::expand_year;
use statemap_core::table::Table;
use std::collections::BTreeMap;

const IDS: [&str; 5] = ["CA", "TX", "NY", "", "  "];
const DATES: [&str; 4] = ["1/1/20", "12/31/20", "1/1/21", "3/15/2021"];

fn row_strategy() -> impl Strategy<Value = (usize, Vec<u32>)> {
    (0..IDS.len(), prop::collection::vec(0u32..10_000, DATES.len()))
}

fn build(rows: &[(usize, Vec<u32>)]) -> Table {
    let mut headers = vec!["State".to_owned()];
    headers.extend(DATES.iter().map(|d| (*d).to_owned()));
    let body = rows
        .iter()
        .map(|(id, vals)| {
            let mut r = vec![IDS[*id].to_owned()];
            r.extend(vals.iter().map(u32::to_string));
            r
        })
        .collect();
    Table::new(headers, body)
}

proptest! {
    #[test]
    fn totals_equal_per_state_sums(rows in prop::collection::vec(row_strategy(), 0..40)) {
        let table = build(&rows);
        let (totals, report) = sum_dated_columns(&table, "State");

        let mut expected: BTreeMap<String, f64> = BTreeMap::new();
        let mut skipped = 0;
        for (id, vals) in &rows {
            let key = IDS[*id].trim();
            if key.is_empty() {
                skipped += 1;
                continue;
            }
            *expected.entry(key.to_owned()).or_insert(0.0) +=
                vals.iter().map(|v| f64::from(*v)).sum::<f64>();
        }
        prop_assert_eq!(totals, expected);
        prop_assert_eq!(report.rows_skipped, skipped);
        prop_assert_eq!(report.rows_used + report.rows_skipped, rows.len());
    }

    #[test]
    fn time_slices_add_up_to_the_total(rows in prop::collection::vec(row_strategy(), 0..40)) {
        let table = build(&rows);
        let (totals, _) = sum_dated_columns(&table, "State");
        let (series, _) = time_sliced(&table, "State");
        prop_assert_eq!(totals.len(), series.len());
        for (state, s) in &series {
            let monthly: f64 = s.monthly.values().sum();
            prop_assert_eq!(s.total(), totals[state]);
            prop_assert_eq!(monthly, totals[state]);
        }
    }

    #[test]
    fn summed_single_values_match(vals in prop::collection::vec((0..3usize, 0u32..1_000_000), 0..30)) {
        let table = Table::new(
            vec!["State".into(), "population".into()],
            vals.iter().map(|(id, v)| vec![IDS[*id].to_owned(), v.to_string()]).collect(),
        );
        let (totals, _) = single_value(&table, "State", "population", Combine::Sum);
        let grand: f64 = totals.values().sum();
        let expected: f64 = vals.iter().map(|(_, v)| f64::from(*v)).sum();
        prop_assert_eq!(grand, expected);
    }

    #[test]
    fn two_digit_years_pivot_at_fifty(y in 0u32..100) {
        let year = expand_year(y);
        if y < 50 {
            prop_assert_eq!(year, 2000 + y as i32);
        } else {
            prop_assert_eq!(year, 1900 + y as i32);
        }
    }
}
