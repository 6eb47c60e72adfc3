// crates/statemap-core/src/geometry.rs

//! Screen-space helpers: projection into the viewport, SVG path data and
//! point-in-shape tests for pointer hit testing.

use crate::boundary::{Bounds, Point, Polygon, Ring};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// How source coordinates reach the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Coordinates are already planar screen units (pre-projected atlas files).
    #[default]
    Identity,
    /// Longitude/latitude scaled uniformly to fit the viewport, north up.
    Fit,
}

/// Affine transform from source coordinates to screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    scale: f64,
    offset: Point,
    flip_y: bool,
    max_y: f64,
}

impl Projector {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset: [0.0, 0.0],
            flip_y: false,
            max_y: 0.0,
        }
    }

    /// Builds the transform for `projection` over `bounds` in a
    /// `width × height` viewport with `padding` pixels on each side.
    pub fn new(
        projection: Projection,
        bounds: Option<Bounds>,
        width: f64,
        height: f64,
        padding: f64,
    ) -> Self {
        let (Projection::Fit, Some(b)) = (projection, bounds) else {
            return Self::identity();
        };
        let span_x = (b.max[0] - b.min[0]).max(f64::EPSILON);
        let span_y = (b.max[1] - b.min[1]).max(f64::EPSILON);
        let avail_x = (width - 2.0 * padding).max(1.0);
        let avail_y = (height - 2.0 * padding).max(1.0);
        let scale = (avail_x / span_x).min(avail_y / span_y);
        // Center the scaled shape in the viewport.
        let off_x = (width - span_x * scale) / 2.0 - b.min[0] * scale;
        let off_y = (height - span_y * scale) / 2.0;
        Self {
            scale,
            offset: [off_x, off_y],
            flip_y: true,
            max_y: b.max[1],
        }
    }

    pub fn project(&self, p: Point) -> Point {
        let x = p[0] * self.scale + self.offset[0];
        let y = if self.flip_y {
            (self.max_y - p[1]) * self.scale + self.offset[1]
        } else {
            p[1] * self.scale + self.offset[1]
        };
        [x, y]
    }

    pub fn project_polygons(&self, polygons: &[Polygon]) -> Vec<Polygon> {
        polygons
            .iter()
            .map(|poly| {
                poly.iter()
                    .map(|ring| ring.iter().map(|p| self.project(*p)).collect())
                    .collect()
            })
            .collect()
    }

    pub fn project_line(&self, line: &[Point]) -> Vec<Point> {
        line.iter().map(|p| self.project(*p)).collect()
    }
}

fn push_coord(out: &mut String, v: f64) {
    let rounded = (v * 100.0).round() / 100.0;
    // -0 prints as "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let _ = write!(out, "{rounded}");
}

fn push_point(out: &mut String, cmd: char, p: Point) {
    out.push(cmd);
    push_coord(out, p[0]);
    out.push(',');
    push_coord(out, p[1]);
}

/// SVG path data for closed rings (`M…L…Z` per ring).
///
/// ```rust
/// use statemap_core::geometry::ring_path;
///
/// let square = vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]];
/// assert_eq!(ring_path(square.iter()), "M0,0L1,0L1,1L0,0Z");
/// ```
pub fn ring_path<'a>(rings: impl IntoIterator<Item = &'a Ring>) -> String {
    let mut out = String::new();
    for ring in rings {
        let mut pts = ring.iter();
        let Some(first) = pts.next() else { continue };
        push_point(&mut out, 'M', *first);
        for p in pts {
            push_point(&mut out, 'L', *p);
        }
        out.push('Z');
    }
    out
}

/// SVG path data for an open polyline.
pub fn line_path(line: &[Point]) -> String {
    let mut out = String::new();
    let mut pts = line.iter();
    if let Some(first) = pts.next() {
        push_point(&mut out, 'M', *first);
        for p in pts {
            push_point(&mut out, 'L', *p);
        }
    }
    out
}

/// Even-odd crossing test against one ring.
fn ring_crossings(ring: &Ring, p: Point) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);
        if (yi > p[1]) != (yj > p[1]) && p[0] < (xj - xi) * (p[1] - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Whether `p` lies inside any polygon; holes are respected.
pub fn contains(polygons: &[Polygon], p: Point) -> bool {
    polygons.iter().any(|poly| {
        poly.iter()
            .fold(false, |inside, ring| inside ^ ring_crossings(ring, p))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        vec![
            [x0, y0],
            [x0 + size, y0],
            [x0 + size, y0 + size],
            [x0, y0 + size],
            [x0, y0],
        ]
    }

    #[test]
    fn identity_leaves_points_alone() {
        let p = Projector::new(Projection::Identity, None, 960.0, 600.0, 0.0);
        assert_eq!(p.project([12.5, 40.0]), [12.5, 40.0]);
    }

    #[test]
    fn fit_scales_into_viewport_north_up() {
        let bounds = Bounds {
            min: [-10.0, 0.0],
            max: [10.0, 10.0],
        };
        let p = Projector::new(Projection::Fit, Some(bounds), 200.0, 100.0, 0.0);
        assert_eq!(p.project([-10.0, 10.0]), [0.0, 0.0]);
        assert_eq!(p.project([10.0, 0.0]), [200.0, 100.0]);
    }

    #[test]
    fn ring_and_line_paths() {
        let ring = vec![[0.125, 0.0], [1.0, 2.0], [0.125, 0.0]];
        assert_eq!(ring_path([&ring]), "M0.13,0L1,2L0.13,0Z");
        assert_eq!(line_path(&[[0.0, 0.0], [3.0, 4.0]]), "M0,0L3,4");
        assert_eq!(line_path(&[]), "");
    }

    #[test]
    fn contains_respects_holes() {
        let donut: Polygon = vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)];
        let shapes = vec![donut];
        assert!(contains(&shapes, [1.0, 1.0]));
        assert!(!contains(&shapes, [5.0, 5.0]));
        assert!(!contains(&shapes, [11.0, 5.0]));
    }

    #[test]
    fn contains_checks_every_polygon() {
        let shapes = vec![vec![square(0.0, 0.0, 1.0)], vec![square(5.0, 5.0, 1.0)]];
        assert!(contains(&shapes, [5.5, 5.5]));
        assert!(!contains(&shapes, [3.0, 3.0]));
    }
}
