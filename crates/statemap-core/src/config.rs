// crates/statemap-core/src/config.rs

//! # Configuration
//!
//! [`MapConfig`] gathers the render options, the column names of each
//! dataset and the data sources. Every field has a default, so an empty JSON
//! object is a valid config. Precedence, lowest first: defaults, config file,
//! environment (`STATEMAP_WIDTH`, `STATEMAP_HEIGHT`, `STATEMAP_SCHEME`),
//! then whatever the caller sets afterwards (the CLI's flags).

use crate::aggregate::Combine;
use crate::error::{MapError, Result};
use crate::loader::Sources;
use crate::model::Metric;
use crate::render::RenderOptions;
use crate::states::StateResolver;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_WIDTH: &str = "STATEMAP_WIDTH";
pub const ENV_HEIGHT: &str = "STATEMAP_HEIGHT";
pub const ENV_SCHEME: &str = "STATEMAP_SCHEME";

/// Column layout of one tabular dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetColumns {
    /// Column holding the state identifier.
    pub state: String,
    /// Value column for single-value datasets; ignored for dated ones.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub combine: Combine,
}

impl DatasetColumns {
    pub fn dated(state: &str) -> Self {
        Self {
            state: state.to_owned(),
            value: None,
            combine: Combine::Sum,
        }
    }

    pub fn single(state: &str, value: &str, combine: Combine) -> Self {
        Self {
            state: state.to_owned(),
            value: Some(value.to_owned()),
            combine,
        }
    }
}

/// Column layouts for the four datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub cases: DatasetColumns,
    pub deaths: DatasetColumns,
    pub population: DatasetColumns,
    pub vaccination: DatasetColumns,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            cases: DatasetColumns::dated("State"),
            deaths: DatasetColumns::dated("State"),
            population: DatasetColumns::single("State", "population", Combine::Sum),
            vaccination: DatasetColumns::single(
                "Jurisdiction",
                "Percent of total pop with at least one dose",
                Combine::Last,
            ),
        }
    }
}

impl Columns {
    pub fn for_metric(&self, metric: Metric) -> &DatasetColumns {
        match metric {
            Metric::Cases => &self.cases,
            Metric::Deaths => &self.deaths,
            Metric::Population => &self.population,
            Metric::Vaccination => &self.vaccination,
        }
    }
}

fn default_object() -> String {
    "states".to_owned()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub render: RenderOptions,
    #[serde(default)]
    pub columns: Columns,
    #[serde(default)]
    pub sources: Sources,
    /// TopoJSON object holding the state shapes.
    #[serde(default = "default_object")]
    pub object: String,
    /// Adds AS, GU, MP, PR and VI to the identifier table.
    #[serde(default)]
    pub include_territories: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            columns: Columns::default(),
            sources: Sources::default(),
            object: default_object(),
            include_territories: false,
        }
    }
}

impl MapConfig {
    /// Reads a JSON config file; environment overrides are not applied.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MapError::NotFound(format!("Config not found at {}: {}", path.display(), e))
        })?;
        let config = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Defaults or `path`, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from_path(p)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(w) = lookup(ENV_WIDTH) {
            self.render.width = parse_dimension(ENV_WIDTH, &w)?;
        }
        if let Some(h) = lookup(ENV_HEIGHT) {
            self.render.height = parse_dimension(ENV_HEIGHT, &h)?;
        }
        if let Some(s) = lookup(ENV_SCHEME) {
            self.render.scheme = s.parse()?;
        }
        Ok(())
    }

    pub fn resolver(&self) -> StateResolver {
        if self.include_territories {
            StateResolver::with_territories()
        } else {
            StateResolver::default()
        }
    }
}

fn parse_dimension(key: &str, raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(MapError::InvalidConfig(format!(
            "{key} must be a positive number, got '{raw}'"
        ))),
    }
}
