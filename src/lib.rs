// src/lib.rs

//! Umbrella crate for the statemap workspace. Hosts the demos and re-exports
//! the core library.

pub use statemap_core;

/// Everything a typical caller needs.
pub mod prelude {
    pub use statemap_core::{
        Boundary, Controller, DataMap, MapConfig, MapError, Metric, Period, PointerEvent,
        Reading, RenderOptions, Renderer, Resource, Result, Scene, Selection, SelectionSource,
        Sources, StateResolver, ValueSlice,
    };
}
