// crates/statemap-core/src/lib.rs

//! # statemap-core
//!
//! Aggregates state-level tabular datasets (case counts, deaths, population,
//! vaccination rates) and paints them as a choropleth over a US boundary
//! file.
//!
//! ```text
//! loader ──> table ──> aggregate ──> model::DataMap ──> render::Renderer
//!   │                                    ▲                    ▲
//!   └──> boundary ───────────────────────┼────────────────────┘
//!                                  states::StateResolver
//! ```
//!
//! [`controller::Controller`] wires the pieces together and re-renders on
//! every selection change.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod aggregate;
pub mod boundary;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod geometry;
pub mod loader;
pub mod model;
pub mod period;
pub mod render;
pub mod scale;
pub mod states;
pub mod table;
pub mod text; // identifier folding

// Re-exports
pub use crate::boundary::{Boundary, Feature, FeatureId};
pub use crate::config::MapConfig;
pub use crate::controller::{Controller, Phase, SelectionSource};
pub use crate::error::{MapError, Result};
pub use crate::loader::{Resource, Sources};
pub use crate::model::{DataMap, Metric, Reading, Selection, StateRecord, ValueSlice};
pub use crate::period::Period;
pub use crate::render::{PointerEvent, RenderOptions, Renderer, Scene, Tooltip};
pub use crate::scale::{ColorDomain, ColorScale, Rgb, ScaleKind, Scheme};
pub use crate::states::{Resolved, StateResolver};
