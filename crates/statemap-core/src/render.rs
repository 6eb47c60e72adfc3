// crates/statemap-core/src/render.rs

//! # Renderer
//!
//! Turns a [`Boundary`] plus a [`ValueSlice`] into a painted [`Scene`]:
//! one shape per feature, interior borders on top, and a tooltip driven by
//! pointer events.
//!
//! A single [`Renderer`] owns the scene, the active scale and the tooltip.
//! Every call to [`Renderer::render`] clears the previous scene first, so
//! switching the selection any number of times leaves exactly one shape per
//! feature.

use crate::boundary::{Boundary, Point, Polygon};
use crate::error::Result;
use crate::format::label;
use crate::geometry::{contains, line_path, ring_path, Projection, Projector};
use crate::model::{Reading, ValueSlice};
use crate::scale::{build_scale, ColorDomain, ColorScale, DomainMode, Rgb, ScaleKind, Scheme};
use crate::states::StateResolver;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

// -----------------------------------------------------------------------------
// Options
// -----------------------------------------------------------------------------

/// Tooltip offset from the pointer, in pixels.
pub const TOOLTIP_OFFSET: (f64, f64) = (10.0, -28.0);

fn default_width() -> f64 {
    960.0
}
fn default_height() -> f64 {
    600.0
}
fn default_fallback() -> Rgb {
    Rgb(0xcc, 0xcc, 0xcc)
}
fn default_stroke() -> Rgb {
    Rgb(0xff, 0xff, 0xff)
}
fn default_stroke_width() -> f64 {
    1.0
}
fn default_decimals() -> usize {
    2
}

/// Everything the renderer needs besides the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    /// Only used by [`Projection::Fit`].
    #[serde(default)]
    pub padding: f64,
    #[serde(default)]
    pub projection: Projection,
    #[serde(default)]
    pub scheme: Scheme,
    #[serde(default)]
    pub scale: ScaleKind,
    #[serde(default)]
    pub domain: DomainMode,
    /// Fill for states with no data.
    #[serde(default = "default_fallback")]
    pub fallback: Rgb,
    /// Fill for a present zero; the scale's color at 0 when unset.
    #[serde(default)]
    pub zero: Option<Rgb>,
    #[serde(default = "default_stroke")]
    pub stroke: Rgb,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default = "default_decimals")]
    pub percent_decimals: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            padding: 0.0,
            projection: Projection::default(),
            scheme: Scheme::default(),
            scale: ScaleKind::default(),
            domain: DomainMode::default(),
            fallback: default_fallback(),
            zero: None,
            stroke: default_stroke(),
            stroke_width: default_stroke_width(),
            percent_decimals: default_decimals(),
        }
    }
}

// -----------------------------------------------------------------------------
// Scene
// -----------------------------------------------------------------------------

/// One painted feature.
#[derive(Debug, Clone)]
pub struct Shape {
    /// Canonical state name, or the feature's own label when unresolved.
    pub name: String,
    pub resolved: bool,
    pub reading: Reading,
    pub fill: Rgb,
    /// Tooltip text.
    pub label: String,
    /// SVG path data in screen coordinates.
    pub path: String,
    polygons: Vec<Polygon>,
}

impl Shape {
    pub fn contains(&self, p: Point) -> bool {
        contains(&self.polygons, p)
    }
}

/// The painted map.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub shapes: Vec<Shape>,
    /// Interior border paths.
    pub borders: Vec<String>,
    pub stroke: Rgb,
    pub stroke_width: f64,
    pub domain: Option<ColorDomain>,
    /// Legend entries: bucket upper bound and color.
    pub legend: Vec<(f64, Rgb)>,
}

impl Scene {
    fn clear(&mut self) {
        self.shapes.clear();
        self.borders.clear();
        self.domain = None;
        self.legend.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Topmost shape under `p`.
    pub fn hit(&self, p: Point) -> Option<&Shape> {
        self.shapes.iter().rev().find(|s| s.contains(p))
    }

    pub fn shape(&self, name: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.name == name)
    }

    /// Standalone SVG document. Each state path carries a `<title>` with its
    /// tooltip text.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        out.push_str("<g class=\"states\">\n");
        for shape in &self.shapes {
            let _ = writeln!(
                out,
                r#"<path class="state" fill="{}" d="{}"><title>{}</title></path>"#,
                shape.fill,
                shape.path,
                escape(&shape.label)
            );
        }
        out.push_str("</g>\n");
        if !self.borders.is_empty() {
            let _ = writeln!(
                out,
                r#"<g class="borders" fill="none" stroke="{}" stroke-width="{}" stroke-linejoin="round">"#,
                self.stroke, self.stroke_width
            );
            for d in &self.borders {
                let _ = writeln!(out, r#"<path d="{d}"/>"#);
            }
            out.push_str("</g>\n");
        }
        out.push_str("</svg>\n");
        out
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// -----------------------------------------------------------------------------
// Pointer + tooltip
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Enter { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Leave,
}

/// Floating label state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tooltip {
    pub visible: bool,
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl Tooltip {
    fn show(&mut self, text: &str, x: f64, y: f64) {
        self.visible = true;
        if self.text != text {
            self.text = text.to_owned();
        }
        self.x = x + TOOLTIP_OFFSET.0;
        self.y = y + TOOLTIP_OFFSET.1;
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

// -----------------------------------------------------------------------------
// Renderer
// -----------------------------------------------------------------------------

#[derive(Debug)]
pub struct Renderer {
    options: RenderOptions,
    resolver: StateResolver,
    scene: Scene,
    scale: Option<Box<dyn ColorScale>>,
    tooltip: Tooltip,
}

impl Renderer {
    pub fn new(options: RenderOptions, resolver: StateResolver) -> Self {
        Self {
            options,
            resolver,
            scene: Scene::default(),
            scale: None,
            tooltip: Tooltip::default(),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn scale(&self) -> Option<&dyn ColorScale> {
        self.scale.as_deref()
    }

    /// Domain over the values of states that appear in `boundary`.
    pub fn domain_for(&self, boundary: &Boundary, slice: &ValueSlice) -> Option<ColorDomain> {
        let observed = ColorDomain::from_values(boundary.features.iter().filter_map(|f| {
            let name = self.resolver.resolve_feature(&f.id).name()?;
            slice.values.get(name).copied()
        }));
        self.options.domain.domain(observed)
    }

    /// Clears the scene and paints `boundary` with `slice`.
    pub fn render(&mut self, boundary: &Boundary, slice: &ValueSlice) -> Result<&Scene> {
        let opts = &self.options;
        let domain = self.domain_for(boundary, slice);
        let scale = domain
            .map(|d| build_scale(opts.scale, &opts.domain, d, opts.scheme))
            .transpose()?;

        self.scene.clear();
        self.tooltip.hide();
        let projector = Projector::new(
            opts.projection,
            boundary.bounds(),
            opts.width,
            opts.height,
            opts.padding,
        );

        let mut missing = 0usize;
        for feature in &boundary.features {
            let resolved = self.resolver.resolve_feature(&feature.id);
            let (name, reading) = match resolved.name() {
                Some(name) => (name.to_owned(), slice.reading(name)),
                None => (feature.id.label(), Reading::NoData),
            };
            if reading == Reading::NoData {
                missing += 1;
            }
            let fill = match (reading, opts.zero, scale.as_deref()) {
                (Reading::Value(v), _, Some(s)) => s.color(v),
                (Reading::Zero, Some(zero), _) => zero,
                (Reading::Zero, None, Some(s)) => s.color(0.0),
                _ => opts.fallback,
            };
            let polygons = projector.project_polygons(&feature.polygons);
            self.scene.shapes.push(Shape {
                label: label(&name, reading, slice.kind, opts.percent_decimals),
                path: ring_path(polygons.iter().flatten()),
                name,
                resolved: resolved.is_known(),
                reading,
                fill,
                polygons,
            });
        }

        self.scene.borders = boundary
            .borders
            .iter()
            .map(|line| line_path(&projector.project_line(line)))
            .collect();
        self.scene.width = opts.width;
        self.scene.height = opts.height;
        self.scene.stroke = opts.stroke;
        self.scene.stroke_width = opts.stroke_width;
        self.scene.domain = domain;
        self.scene.legend = scale.as_ref().map(|s| s.buckets()).unwrap_or_default();
        self.scale = scale;

        tracing::info!(
            selection = %slice.selection,
            shapes = self.scene.shapes.len(),
            no_data = missing,
            "rendered map"
        );
        Ok(&self.scene)
    }

    /// Updates the tooltip for a pointer event in screen coordinates.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> &Tooltip {
        match event {
            PointerEvent::Enter { x, y } | PointerEvent::Move { x, y } => {
                match self.scene.hit([x, y]) {
                    Some(shape) => self.tooltip.show(&shape.label, x, y),
                    None => self.tooltip.hide(),
                }
            }
            PointerEvent::Leave => self.tooltip.hide(),
        }
        &self.tooltip
    }
}
