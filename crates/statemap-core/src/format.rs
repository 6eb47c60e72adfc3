// crates/statemap-core/src/format.rs
use crate::model::{MetricKind, Reading};

pub const NO_DATA: &str = "No data";

/// Rounds to an integer and inserts `,` every three digits.
///
/// ```rust
/// use statemap_core::format::format_count;
///
/// assert_eq!(format_count(1234567.4), "1,234,567");
/// assert_eq!(format_count(999.0), "999");
/// ```
pub fn format_count(v: f64) -> String {
    let n = v.round();
    let digits = format!("{:.0}", n.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_percent(v: f64, decimals: usize) -> String {
    format!("{v:.decimals$}%")
}

pub fn format_value(v: f64, kind: MetricKind, decimals: usize) -> String {
    match kind {
        MetricKind::Count => format_count(v),
        MetricKind::Percent => format_percent(v, decimals),
    }
}

pub fn format_reading(reading: Reading, kind: MetricKind, decimals: usize) -> String {
    match reading {
        Reading::Value(v) => format_value(v, kind, decimals),
        Reading::Zero => format_value(0.0, kind, decimals),
        Reading::NoData => NO_DATA.to_owned(),
    }
}

/// Tooltip text: `"{name}: {value}"`.
pub fn label(name: &str, reading: Reading, kind: MetricKind, decimals: usize) -> String {
    format!("{name}: {}", format_reading(reading, kind, decimals))
}
