// crates/statemap-core/src/table.rs

//! Delimited tabular input: one header row, then string cells.

use crate::error::Result;
use std::collections::HashMap;
use std::io::Read;

/// A parsed CSV file. Cells stay strings; numeric coercion happens in the
/// aggregator so a bad cell never fails the load.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

/// A borrowed row with by-name access.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Cell for `column`, or `None` when the column is absent or the row is short.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = *self.table.index.get(column)?;
        self.cells.get(idx).map(String::as_str)
    }

    /// `(header, cell)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let cells = self.cells;
        self.table
            .headers
            .iter()
            .enumerate()
            .filter_map(move |(i, h)| cells.get(i).map(|c| (h.as_str(), c.as_str())))
    }
}

impl Table {
    /// Reads a comma-delimited stream with a header row.
    ///
    /// Headers and cells are trimmed and ragged rows are accepted; missing
    /// trailing cells read as absent.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_owned).collect());
        }
        Ok(Self::new(headers, rows))
    }

    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut index = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            // First occurrence wins for duplicated headers.
            index.entry(h.clone()).or_insert(i);
        }
        Self {
            headers,
            index,
            rows,
        }
    }

    /// Builds a table from rows given as `(column, value)` pairs.
    ///
    /// Columns are the union of every row's keys in first-seen order.
    ///
    /// ```rust
    /// use statemap_core::table::Table;
    ///
    /// let t = Table::from_records(vec![
    ///     vec![("State", "CA"), ("1/1/21", "100")],
    ///     vec![("State", "TX"), ("1/2/21", "7")],
    /// ]);
    /// assert_eq!(t.headers(), ["State", "1/1/21", "1/2/21"]);
    /// assert_eq!(t.row(1).and_then(|r| r.get("1/1/21")), None);
    /// ```
    pub fn from_records<I, R, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut sparse: Vec<Vec<(usize, String)>> = Vec::new();

        for record in records {
            let mut cells = Vec::new();
            for (k, v) in record {
                let k = k.as_ref();
                let col = match index.get(k) {
                    Some(&i) => i,
                    None => {
                        headers.push(k.to_owned());
                        index.insert(k.to_owned(), headers.len() - 1);
                        headers.len() - 1
                    }
                };
                cells.push((col, v.as_ref().to_owned()));
            }
            sparse.push(cells);
        }

        let width = headers.len();
        let rows = sparse
            .into_iter()
            .map(|cells| {
                let mut row = vec![String::new(); width];
                for (col, v) in cells {
                    row[col] = v;
                }
                row
            })
            .collect();

        Self::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<Row<'_>> {
        self.rows.get(i).map(|cells| Row { table: self, cells })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row { table: self, cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_csv_with_trimmed_headers() {
        let csv = "State , 1/22/20,1/23/20\nCA, 1 ,2\nTX,3\n";
        let t = Table::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(t.headers(), ["State", "1/22/20", "1/23/20"]);
        assert_eq!(t.len(), 2);

        let ca = t.row(0).unwrap();
        assert_eq!(ca.get("State"), Some("CA"));
        assert_eq!(ca.get("1/22/20"), Some("1"));

        let tx = t.row(1).unwrap();
        assert_eq!(tx.get("1/23/20"), None);
        assert_eq!(tx.get("missing"), None);
    }

    #[test]
    fn quoted_cells_keep_commas() {
        let csv = "Jurisdiction,Doses\n\"Washington, D.C.\",\"1,000\"\n";
        let t = Table::from_reader(csv.as_bytes()).unwrap();
        let row = t.row(0).unwrap();
        assert_eq!(row.get("Jurisdiction"), Some("Washington, D.C."));
        assert_eq!(row.get("Doses"), Some("1,000"));
    }

    #[test]
    fn row_iter_pairs_headers_with_cells() {
        let t = Table::from_records(vec![vec![("a", "1"), ("b", "2")]]);
        let pairs: Vec<_> = t.row(0).unwrap().iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }
}
