// crates/statemap-core/src/loader.rs

//! # Data Loader
//!
//! Handles the physical layer (files, URLs, decompression) and hands the
//! bytes to the boundary decoder and the CSV reader.
//!
//! Every resource is fetched on its own scoped thread; [`load`] returns only
//! once all of them finished, and fails with the first error in source order.

use crate::boundary::Boundary;
use crate::error::{MapError, Result};
use crate::model::Metric;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::thread;

#[cfg(feature = "compact")]
use flate2::read::GzDecoder;

/// Where one input comes from. Strings starting with `http://` or
/// `https://` are URLs, anything else is a local path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Resource {
    File(PathBuf),
    Url(String),
}

impl From<String> for Resource {
    fn from(s: String) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Resource::Url(s)
        } else {
            Resource::File(PathBuf::from(s))
        }
    }
}

impl From<&str> for Resource {
    fn from(s: &str) -> Self {
        Resource::from(s.to_owned())
    }
}

impl From<Resource> for String {
    fn from(r: Resource) -> Self {
        r.to_string()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::File(p) => write!(f, "{}", p.display()),
            Resource::Url(u) => f.write_str(u),
        }
    }
}

impl Resource {
    fn is_gzip(&self) -> bool {
        match self {
            Resource::File(p) => p.extension().is_some_and(|e| e == "gz"),
            Resource::Url(u) => u.ends_with(".gz"),
        }
    }

    /// Reads the whole resource, decompressing `.gz` inputs.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        let mut reader = self.open()?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        let raw: Box<dyn Read + Send> = match self {
            Resource::File(p) => open_file(p)?,
            Resource::Url(u) => fetch_url(u)?,
        };
        decompress(raw, self.is_gzip())
    }
}

fn open_file(path: &Path) -> Result<Box<dyn Read + Send>> {
    let file = File::open(path).map_err(|e| {
        MapError::NotFound(format!("Dataset not found at {}: {}", path.display(), e))
    })?;
    Ok(Box::new(BufReader::new(file)))
}

#[cfg(feature = "compact")]
fn decompress(reader: Box<dyn Read + Send>, gzip: bool) -> Result<Box<dyn Read + Send>> {
    if gzip {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(reader)
    }
}

#[cfg(not(feature = "compact"))]
fn decompress(reader: Box<dyn Read + Send>, gzip: bool) -> Result<Box<dyn Read + Send>> {
    if gzip {
        Err(MapError::InvalidConfig(
            "gzip input requires the 'compact' feature".into(),
        ))
    } else {
        Ok(reader)
    }
}

#[cfg(feature = "fetch")]
fn fetch_url(url: &str) -> Result<Box<dyn Read + Send>> {
    let fail = |reason: String| MapError::Fetch {
        url: url.to_owned(),
        reason,
    };
    let resp = reqwest::blocking::get(url).map_err(|e| fail(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(fail(format!("HTTP {status}")));
    }
    let bytes = resp.bytes().map_err(|e| fail(e.to_string()))?;
    Ok(Box::new(std::io::Cursor::new(bytes.to_vec())))
}

#[cfg(not(feature = "fetch"))]
fn fetch_url(url: &str) -> Result<Box<dyn Read + Send>> {
    Err(MapError::Fetch {
        url: url.to_owned(),
        reason: "URL sources require the 'fetch' feature".into(),
    })
}

/// The boundary file plus up to four datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sources {
    pub boundary: Option<Resource>,
    pub cases: Option<Resource>,
    pub deaths: Option<Resource>,
    pub population: Option<Resource>,
    pub vaccination: Option<Resource>,
}

impl Sources {
    pub fn dataset(&self, metric: Metric) -> Option<&Resource> {
        match metric {
            Metric::Cases => self.cases.as_ref(),
            Metric::Deaths => self.deaths.as_ref(),
            Metric::Population => self.population.as_ref(),
            Metric::Vaccination => self.vaccination.as_ref(),
        }
    }

    pub fn set_dataset(&mut self, metric: Metric, resource: Resource) {
        let slot = match metric {
            Metric::Cases => &mut self.cases,
            Metric::Deaths => &mut self.deaths,
            Metric::Population => &mut self.population,
            Metric::Vaccination => &mut self.vaccination,
        };
        *slot = Some(resource);
    }
}

/// Everything one load produced.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub boundary: Boundary,
    pub tables: BTreeMap<Metric, Table>,
}

/// Parses a boundary resource.
pub fn load_boundary(resource: &Resource, object: &str) -> Result<Boundary> {
    let bytes = resource.read_bytes()?;
    let boundary = Boundary::from_slice(&bytes, object)?;
    tracing::debug!(%resource, features = boundary.len(), "parsed boundary");
    Ok(boundary)
}

/// Parses a CSV resource.
pub fn load_table(resource: &Resource) -> Result<Table> {
    let table = Table::from_reader(resource.open()?)?;
    tracing::debug!(%resource, rows = table.len(), "parsed table");
    Ok(table)
}

/// Fetches every configured resource concurrently and waits for all of them.
pub fn load(sources: &Sources, object: &str) -> Result<Loaded> {
    let boundary_src = sources
        .boundary
        .as_ref()
        .ok_or_else(|| MapError::InvalidConfig("no boundary source configured".into()))?;
    let datasets: Vec<(Metric, &Resource)> = Metric::ALL
        .iter()
        .filter_map(|&m| sources.dataset(m).map(|r| (m, r)))
        .collect();

    tracing::info!(
        boundary = %boundary_src,
        datasets = datasets.len(),
        "loading sources"
    );

    let (boundary, tables) = thread::scope(|scope| {
        let boundary = scope.spawn(|| load_boundary(boundary_src, object));
        let tables: Vec<_> = datasets
            .iter()
            .map(|&(metric, resource)| (metric, scope.spawn(move || load_table(resource))))
            .collect();
        // Join every handle before reporting, so no fetch outlives the load.
        let boundary = join(boundary);
        let tables: Vec<_> = tables.into_iter().map(|(m, h)| (m, join(h))).collect();
        (boundary, tables)
    });

    let boundary = boundary?;
    let mut out = BTreeMap::new();
    for (metric, table) in tables {
        out.insert(metric, table?);
    }
    tracing::info!(
        features = boundary.len(),
        datasets = out.len(),
        "all sources loaded"
    );
    Ok(Loaded {
        boundary,
        tables: out,
    })
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(MapError::Io(std::io::Error::other("loader thread panicked"))))
}
