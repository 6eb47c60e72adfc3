// crates/statemap-core/src/states.rs

//! # Identifier Reconciler
//!
//! Boundary files, case/death tables and vaccination tables each key states
//! differently: postal code (`CA`), full name (`California`), FIPS id (`06`)
//! or ISO 3166-2 (`US-CA`). Every component resolves identifiers through the
//! one [`StateResolver`] defined here.

use crate::boundary::FeatureId;
use crate::text::fold_key;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StateKind {
    State,
    District,
    Territory,
}

/// One entry of the fixed identifier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StateInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub fips: u8,
    pub kind: StateKind,
}

impl fmt::Display for StateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

const fn entry(code: &'static str, name: &'static str, fips: u8, kind: StateKind) -> StateInfo {
    StateInfo {
        code,
        name,
        fips,
        kind,
    }
}

use self::StateKind::{District, State, Territory};

/// 50 states, DC, and the five inhabited territories (last five rows).
static STATES: [StateInfo; 56] = [
    entry("AL", "Alabama", 1, State),
    entry("AK", "Alaska", 2, State),
    entry("AZ", "Arizona", 4, State),
    entry("AR", "Arkansas", 5, State),
    entry("CA", "California", 6, State),
    entry("CO", "Colorado", 8, State),
    entry("CT", "Connecticut", 9, State),
    entry("DE", "Delaware", 10, State),
    entry("DC", "District of Columbia", 11, District),
    entry("FL", "Florida", 12, State),
    entry("GA", "Georgia", 13, State),
    entry("HI", "Hawaii", 15, State),
    entry("ID", "Idaho", 16, State),
    entry("IL", "Illinois", 17, State),
    entry("IN", "Indiana", 18, State),
    entry("IA", "Iowa", 19, State),
    entry("KS", "Kansas", 20, State),
    entry("KY", "Kentucky", 21, State),
    entry("LA", "Louisiana", 22, State),
    entry("ME", "Maine", 23, State),
    entry("MD", "Maryland", 24, State),
    entry("MA", "Massachusetts", 25, State),
    entry("MI", "Michigan", 26, State),
    entry("MN", "Minnesota", 27, State),
    entry("MS", "Mississippi", 28, State),
    entry("MO", "Missouri", 29, State),
    entry("MT", "Montana", 30, State),
    entry("NE", "Nebraska", 31, State),
    entry("NV", "Nevada", 32, State),
    entry("NH", "New Hampshire", 33, State),
    entry("NJ", "New Jersey", 34, State),
    entry("NM", "New Mexico", 35, State),
    entry("NY", "New York", 36, State),
    entry("NC", "North Carolina", 37, State),
    entry("ND", "North Dakota", 38, State),
    entry("OH", "Ohio", 39, State),
    entry("OK", "Oklahoma", 40, State),
    entry("OR", "Oregon", 41, State),
    entry("PA", "Pennsylvania", 42, State),
    entry("RI", "Rhode Island", 44, State),
    entry("SC", "South Carolina", 45, State),
    entry("SD", "South Dakota", 46, State),
    entry("TN", "Tennessee", 47, State),
    entry("TX", "Texas", 48, State),
    entry("UT", "Utah", 49, State),
    entry("VT", "Vermont", 50, State),
    entry("VA", "Virginia", 51, State),
    entry("WA", "Washington", 53, State),
    entry("WV", "West Virginia", 54, State),
    entry("WI", "Wisconsin", 55, State),
    entry("WY", "Wyoming", 56, State),
    entry("AS", "American Samoa", 60, Territory),
    entry("GU", "Guam", 66, Territory),
    entry("MP", "Northern Mariana Islands", 69, Territory),
    entry("PR", "Puerto Rico", 72, Territory),
    entry("VI", "U.S. Virgin Islands", 78, Territory),
];

/// Spellings seen in public datasets that differ from the canonical name.
static NAME_ALIASES: &[(&str, &str)] = &[
    ("New York State", "NY"),
    ("Washington DC", "DC"),
    ("Washington D.C.", "DC"),
    ("District Of Columbia", "DC"),
    ("Virgin Islands", "VI"),
    ("United States Virgin Islands", "VI"),
    ("Commonwealth of the Northern Mariana Islands", "MP"),
    ("Northern Mariana Is", "MP"),
];

static FULL_MAP: Lazy<StateIdentifierMap> =
    Lazy::new(|| StateIdentifierMap::from_entries(&STATES[..]));
static STANDARD_MAP: Lazy<StateIdentifierMap> = Lazy::new(|| {
    StateIdentifierMap::from_entries(
        &STATES
            .iter()
            .copied()
            .filter(|s| s.kind != Territory)
            .collect::<Vec<_>>(),
    )
});

/// Fixed bidirectional association between postal codes, names and FIPS ids.
///
/// Never derived from input data. [`StateIdentifierMap::standard`] holds the
/// 51 entries (50 states + DC); [`StateIdentifierMap::with_territories`]
/// adds AS, GU, MP, PR and VI.
#[derive(Debug, Clone)]
pub struct StateIdentifierMap {
    entries: Vec<StateInfo>,
    by_code: HashMap<&'static str, usize>,
    by_name: HashMap<String, usize>,
    by_fips: HashMap<u8, usize>,
}

impl StateIdentifierMap {
    fn from_entries(entries: &[StateInfo]) -> Self {
        let entries = entries.to_vec();
        let mut by_code = HashMap::with_capacity(entries.len());
        let mut by_name = HashMap::with_capacity(entries.len() + NAME_ALIASES.len());
        let mut by_fips = HashMap::with_capacity(entries.len());
        for (idx, info) in entries.iter().enumerate() {
            by_code.insert(info.code, idx);
            by_name.insert(fold_key(info.name), idx);
            by_fips.insert(info.fips, idx);
        }
        for (alias, code) in NAME_ALIASES {
            if let Some(&idx) = by_code.get(code) {
                by_name.entry(fold_key(alias)).or_insert(idx);
            }
        }
        Self {
            entries,
            by_code,
            by_name,
            by_fips,
        }
    }

    /// 50 states + DC.
    pub fn standard() -> &'static Self {
        &STANDARD_MAP
    }

    /// 50 states + DC + the five inhabited territories.
    pub fn with_territories() -> &'static Self {
        &FULL_MAP
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateInfo> {
        self.entries.iter()
    }

    /// Case-insensitive postal code lookup (`"ca"` → California).
    pub fn by_code(&self, code: &str) -> Option<&StateInfo> {
        let upper = code.trim().to_ascii_uppercase();
        self.by_code.get(upper.as_str()).map(|&i| &self.entries[i])
    }

    /// Name lookup on the folded form, aliases included.
    pub fn by_name(&self, name: &str) -> Option<&StateInfo> {
        self.by_name.get(&fold_key(name)).map(|&i| &self.entries[i])
    }

    pub fn by_fips(&self, fips: u64) -> Option<&StateInfo> {
        u8::try_from(fips)
            .ok()
            .and_then(|f| self.by_fips.get(&f))
            .map(|&i| &self.entries[i])
    }

    pub fn code_to_name(&self, code: &str) -> Option<&'static str> {
        self.by_code(code).map(|s| s.name)
    }

    pub fn name_to_code(&self, name: &str) -> Option<&'static str> {
        self.by_name(name).map(|s| s.code)
    }
}

/// Outcome of resolving an identifier. `Unknown` is the "no data" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    State(StateInfo),
    Unknown,
}

impl Resolved {
    pub fn state(&self) -> Option<&StateInfo> {
        match self {
            Resolved::State(s) => Some(s),
            Resolved::Unknown => None,
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        self.state().map(|s| s.name)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Resolved::State(_))
    }
}

/// Resolves any identifier shape to the canonical state.
///
/// # Examples
/// ```rust
/// use statemap_core::states::StateResolver;
///
/// let resolver = StateResolver::default();
/// assert_eq!(resolver.resolve("CA").name(), Some("California"));
/// assert_eq!(resolver.resolve("06").name(), Some("California"));
/// assert_eq!(resolver.resolve("US-CA").name(), Some("California"));
/// assert_eq!(resolver.resolve("california").name(), Some("California"));
/// assert!(!resolver.resolve("Atlantis").is_known());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StateResolver {
    map: &'static StateIdentifierMap,
}

impl Default for StateResolver {
    fn default() -> Self {
        Self::new(StateIdentifierMap::standard())
    }
}

impl StateResolver {
    pub fn new(map: &'static StateIdentifierMap) -> Self {
        Self { map }
    }

    pub fn with_territories() -> Self {
        Self::new(StateIdentifierMap::with_territories())
    }

    pub fn map(&self) -> &'static StateIdentifierMap {
        self.map
    }

    /// Code, ISO 3166-2, FIPS digits, then folded name. Never fails.
    pub fn resolve(&self, ident: &str) -> Resolved {
        let ident = ident.trim();
        if ident.is_empty() {
            return Resolved::Unknown;
        }

        if ident.len() == 2 && ident.chars().all(|c| c.is_ascii_alphabetic()) {
            if let Some(s) = self.map.by_code(ident) {
                return Resolved::State(*s);
            }
        }

        if let Some(sub) = ident
            .strip_prefix("US-")
            .or_else(|| ident.strip_prefix("us-"))
        {
            if let Some(s) = self.map.by_code(sub) {
                return Resolved::State(*s);
            }
        }

        if ident.len() <= 2 && ident.chars().all(|c| c.is_ascii_digit()) {
            return ident
                .parse::<u64>()
                .ok()
                .and_then(|n| self.map.by_fips(n))
                .map_or(Resolved::Unknown, |s| Resolved::State(*s));
        }

        self.map
            .by_name(ident)
            .map_or(Resolved::Unknown, |s| Resolved::State(*s))
    }

    /// Resolves a boundary feature, preferring its name property over its id.
    pub fn resolve_feature(&self, id: &FeatureId) -> Resolved {
        if let Some(name) = id.name.as_deref() {
            let r = self.resolve(name);
            if r.is_known() {
                return r;
            }
        }
        match &id.id {
            Some(crate::boundary::RawId::Text(t)) => self.resolve(t),
            Some(crate::boundary::RawId::Number(n)) => self
                .map
                .by_fips(*n)
                .map_or(Resolved::Unknown, |s| Resolved::State(*s)),
            None => Resolved::Unknown,
        }
    }
}
