// crates/statemap-core/src/period.rs

//! Date column headers (`M/D/YY`) and the period keys derived from them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MapError;

static DATE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{2,4})").expect("static date pattern compiles")
});

/// Two-digit years below this pivot land in the 2000s, the rest in the 1900s.
pub const CENTURY_PIVOT: u32 = 50;

/// Expands a year as written in a header. Two-digit years use
/// [`CENTURY_PIVOT`]; longer years are taken literally.
///
/// ```rust
/// use statemap_core::period::expand_year;
///
/// assert_eq!(expand_year(20), 2020);
/// assert_eq!(expand_year(99), 1999);
/// assert_eq!(expand_year(2021), 2021);
/// ```
pub fn expand_year(year: u32) -> i32 {
    let year = year as i32;
    match year {
        y if y < CENTURY_PIVOT as i32 => 2000 + y,
        y if y < 100 => 1900 + y,
        y => y,
    }
}

/// A parsed date column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateColumn {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl DateColumn {
    /// Parses the first `M/D/YY` (or `M/D/YYYY`) occurrence in a header.
    ///
    /// Returns `None` for non-date headers and impossible month/day numbers.
    pub fn parse(header: &str) -> Option<Self> {
        let caps = DATE_HEADER.captures(header)?;
        let month: u8 = caps[1].parse().ok()?;
        let day: u8 = caps[2].parse().ok()?;
        let year: u32 = caps[3].parse().ok()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(Self {
            year: expand_year(year),
            month,
            day,
        })
    }

    pub fn month_key(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }
}

/// Returns whether a header names a date column.
pub fn is_date_header(header: &str) -> bool {
    DATE_HEADER.is_match(header)
}

/// A calendar month. Displays as `"M-YYYY"`; orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u8,
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.month, self.year)
    }
}

/// The time window of a selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Period {
    /// Every dated column.
    #[default]
    Total,
    Year { year: i32 },
    Month { year: i32, month: u8 },
}

impl Period {
    pub fn year(year: i32) -> Self {
        Period::Year { year }
    }

    pub fn month(month: u8, year: i32) -> Self {
        Period::Month { year, month }
    }

    /// Granularity label used by the selectors.
    pub fn granularity(&self) -> &'static str {
        match self {
            Period::Total => "total",
            Period::Year { .. } => "yearly",
            Period::Month { .. } => "monthly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Total => f.write_str("total"),
            Period::Year { year } => write!(f, "{year}"),
            Period::Month { year, month } => write!(f, "{month}-{year}"),
        }
    }
}

impl FromStr for Period {
    type Err = MapError;

    /// Accepts `total`, `YYYY`, `M-YYYY` and `M/YYYY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("total") || s.eq_ignore_ascii_case("all") {
            return Ok(Period::Total);
        }
        let bad = || MapError::InvalidSelection(format!("unrecognized period '{s}'"));
        match s.split_once(|c: char| c == '-' || c == '/') {
            Some((m, y)) => {
                let month: u8 = m.trim().parse().map_err(|_| bad())?;
                let year: i32 = y.trim().parse().map_err(|_| bad())?;
                if !(1..=12).contains(&month) {
                    return Err(bad());
                }
                Ok(Period::month(month, year))
            }
            None => s.parse().map(Period::year).map_err(|_| bad()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_digit_years_pivot_at_fifty() {
        assert_eq!(DateColumn::parse("3/1/20").map(|d| d.year), Some(2020));
        assert_eq!(DateColumn::parse("3/1/99").map(|d| d.year), Some(1999));
        assert_eq!(DateColumn::parse("3/1/49").map(|d| d.year), Some(2049));
        assert_eq!(DateColumn::parse("3/1/50").map(|d| d.year), Some(1950));
    }

    #[test]
    fn four_digit_years_are_literal() {
        let d = DateColumn::parse("12/31/2021").unwrap();
        assert_eq!((d.month, d.day, d.year), (12, 31, 2021));
    }

    #[test]
    fn non_date_headers_are_rejected() {
        assert!(DateColumn::parse("State").is_none());
        assert!(DateColumn::parse("countyFIPS").is_none());
        assert!(DateColumn::parse("13/1/20").is_none());
        assert!(!is_date_header("population"));
        assert!(is_date_header("1/22/20"));
    }

    #[test]
    fn month_key_formats_as_month_dash_year() {
        let d = DateColumn::parse("1/22/20").unwrap();
        assert_eq!(d.month_key().to_string(), "1-2020");
    }

    #[test]
    fn month_keys_order_chronologically() {
        let dec = MonthKey { year: 2020, month: 12 };
        let jan = MonthKey { year: 2021, month: 1 };
        assert!(dec < jan);
    }

    #[test]
    fn period_parses_selector_values() {
        assert_eq!("total".parse::<Period>().unwrap(), Period::Total);
        assert_eq!("2021".parse::<Period>().unwrap(), Period::year(2021));
        assert_eq!("3-2020".parse::<Period>().unwrap(), Period::month(3, 2020));
        assert_eq!("3/2020".parse::<Period>().unwrap(), Period::month(3, 2020));
        assert!("13-2020".parse::<Period>().is_err());
        assert!("soon".parse::<Period>().is_err());
    }

    #[test]
    fn period_display_matches_keys() {
        assert_eq!(Period::month(3, 2020).to_string(), "3-2020");
        assert_eq!(Period::year(2021).to_string(), "2021");
        assert_eq!(Period::Total.granularity(), "total");
    }
}
