// crates/statemap-core/src/text.rs

/// Convert a string into a folded key suitable for identifier comparison.
///
/// This performs:
/// 1\) Transliterate Unicode → ASCII (e.g. `Hawaiʻi` -> `Hawai'i`)
/// 2\) Drop punctuation and collapse whitespace
/// 3\) Normalize to lowercase
///
/// # Examples
///
/// ```rust
/// use statemap_core::text::fold_key;
///
/// assert_eq!(fold_key("  New   York "), "new york");
/// assert_eq!(fold_key("Washington, D.C."), "washington dc");
/// ```
pub fn fold_key(s: &str) -> String {
    let ascii = deunicode::deunicode(s).to_lowercase();
    let mut out = String::with_capacity(ascii.len());
    let mut pending_space = false;
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_space = true;
        }
    }
    out
}

/// Parses a table cell as a non-negative number.
///
/// Accepts integers, floats and thousands separators (`"1,234"`). Anything
/// else, including negative values and empty cells, yields `None`; callers
/// coerce that to zero.
pub fn parse_cell(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String;
    let candidate = if trimmed.contains(',') {
        cleaned = trimmed.replace(',', "");
        cleaned.as_str()
    } else {
        trimmed
    };
    let candidate = candidate.strip_suffix('%').unwrap_or(candidate);
    candidate
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}
