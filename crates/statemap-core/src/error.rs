// crates/statemap-core/src/error.rs
use thiserror::Error;

/// Errors produced while loading inputs or deriving a map view.
///
/// Numeric parse failures and unknown state identifiers are *not* errors:
/// they coerce to zero and "no data" respectively. Everything here aborts
/// the current load or render cycle.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Invalid boundary file: {0}")]
    InvalidBoundary(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Metric '{0}' was not loaded")]
    MetricUnavailable(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}

pub type Result<T> = std::result::Result<T, MapError>;
