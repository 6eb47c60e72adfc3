// crates/statemap-core/src/boundary.rs

//! # Boundary files
//!
//! Decodes state polygons from either a TopoJSON `Topology` (quantized,
//! delta-encoded arcs shared between neighbours) or a GeoJSON
//! `FeatureCollection`. The output is the same either way: one [`Feature`]
//! per shape with its rings in source coordinates, plus, for topologies, the
//! interior border lines between neighbouring shapes.

use crate::error::{MapError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub type Point = [f64; 2];
/// A closed ring. The first ring of a polygon is its exterior.
pub type Ring = Vec<Point>;
pub type Polygon = Vec<Ring>;

/// Property keys checked, in order, for a feature's display name.
const NAME_KEYS: [&str; 5] = ["name", "NAME", "state", "STATE_NAME", "State"];

/// Identifier as found in the source; its shape varies per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawId {
    Text(String),
    Number(u64),
}

/// Whatever a boundary source uses to name a shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureId {
    pub id: Option<RawId>,
    pub name: Option<String>,
}

impl FeatureId {
    fn from_json(id: Option<&Value>, properties: Option<&Value>) -> Self {
        let id = match id {
            Some(Value::String(s)) => Some(RawId::Text(s.clone())),
            Some(Value::Number(n)) => n.as_u64().map(RawId::Number),
            _ => None,
        };
        let name = properties.and_then(|p| {
            NAME_KEYS
                .iter()
                .find_map(|k| p.get(*k).and_then(Value::as_str))
                .map(str::to_owned)
        });
        Self { id, name }
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match (&self.name, &self.id) {
            (Some(n), _) => n.clone(),
            (None, Some(RawId::Text(t))) => t.clone(),
            (None, Some(RawId::Number(n))) => n.to_string(),
            (None, None) => "<unnamed>".to_owned(),
        }
    }
}

/// One drawable shape.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: FeatureId,
    pub polygons: Vec<Polygon>,
}

impl Feature {
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons.iter().flatten()
    }
}

/// Decoded boundary file.
#[derive(Debug, Clone, Default)]
pub struct Boundary {
    pub features: Vec<Feature>,
    /// Lines shared by two different shapes.
    pub borders: Vec<Vec<Point>>,
}

/// Axis-aligned bounding box `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Boundary {
    /// Parses TopoJSON or GeoJSON from raw bytes.
    ///
    /// `object` names the TopoJSON object holding the shapes (`"states"` in
    /// the usual US atlas files); it is ignored for GeoJSON.
    pub fn from_slice(bytes: &[u8], object: &str) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value, object)
    }

    pub fn from_value(value: Value, object: &str) -> Result<Self> {
        match value.get("type").and_then(Value::as_str) {
            Some("Topology") => {
                let topo: Topology = serde_json::from_value(value)?;
                topo.into_boundary(object)
            }
            Some("FeatureCollection") => {
                let fc: FeatureCollection = serde_json::from_value(value)?;
                fc.into_boundary()
            }
            Some(other) => Err(MapError::InvalidBoundary(format!(
                "unsupported top-level type '{other}'"
            ))),
            None => Err(MapError::InvalidBoundary("missing 'type'".into())),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Bounds over every ring point, `None` for an empty boundary.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self.features.iter().flat_map(Feature::rings).flatten();
        let first = *points.next()?;
        let mut b = Bounds {
            min: first,
            max: first,
        };
        for p in points {
            b.min[0] = b.min[0].min(p[0]);
            b.min[1] = b.min[1].min(p[1]);
            b.max[0] = b.max[0].max(p[0]);
            b.max[1] = b.max[1].max(p[1]);
        }
        Some(b)
    }
}

// -----------------------------------------------------------------------------
// TopoJSON
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    objects: BTreeMap<String, TopoGeometry>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TopoGeometry {
    GeometryCollection {
        geometries: Vec<TopoGeometry>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Value>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Value>,
    },
    #[serde(other)]
    Unsupported,
}

/// Decodes delta-encoded, quantized arcs into absolute coordinates.
fn decode_arcs(arcs: &[Vec<Vec<f64>>], transform: Option<&Transform>) -> Vec<Vec<Point>> {
    arcs.iter()
        .map(|arc| match transform {
            Some(t) => {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| {
                        x += p[0];
                        y += p[1];
                        [x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
                    })
                    .collect()
            }
            None => arc
                .iter()
                .filter(|p| p.len() >= 2)
                .map(|p| [p[0], p[1]])
                .collect(),
        })
        .collect()
}

/// Arc reference → (index, reversed). Negative references use one's complement.
fn arc_ref(i: i64) -> (usize, bool) {
    if i < 0 {
        ((!i) as usize, true)
    } else {
        (i as usize, false)
    }
}

/// Joins arcs into a ring, dropping the duplicated point where arcs meet.
fn stitch(indices: &[i64], arcs: &[Vec<Point>]) -> Result<Ring> {
    let mut ring: Ring = Vec::new();
    for &i in indices {
        let (idx, reversed) = arc_ref(i);
        let arc = arcs
            .get(idx)
            .ok_or_else(|| MapError::InvalidBoundary(format!("arc {idx} out of range")))?;
        ring.pop();
        if reversed {
            ring.extend(arc.iter().rev().copied());
        } else {
            ring.extend(arc.iter().copied());
        }
    }
    Ok(ring)
}

impl Topology {
    fn into_boundary(self, object: &str) -> Result<Boundary> {
        let root = self.objects.get(object).ok_or_else(|| {
            let known: Vec<&str> = self.objects.keys().map(String::as_str).collect();
            MapError::InvalidBoundary(format!(
                "object '{object}' not found (available: {})",
                known.join(", ")
            ))
        })?;

        let arcs = decode_arcs(&self.arcs, self.transform.as_ref());
        let mut features = Vec::new();
        // arc index -> shapes referencing it
        let mut usage: HashMap<usize, Vec<usize>> = HashMap::new();

        let mut leaves = Vec::new();
        flatten(root, &mut leaves);

        for geom in leaves {
            let feature_idx = features.len();
            let (id, polygons) = match geom {
                TopoGeometry::Polygon {
                    arcs: rings,
                    id,
                    properties,
                } => (
                    FeatureId::from_json(id.as_ref(), properties.as_ref()),
                    vec![rings.as_slice()],
                ),
                TopoGeometry::MultiPolygon {
                    arcs: polys,
                    id,
                    properties,
                } => (
                    FeatureId::from_json(id.as_ref(), properties.as_ref()),
                    polys.iter().map(Vec::as_slice).collect(),
                ),
                _ => continue,
            };

            let mut decoded = Vec::with_capacity(polygons.len());
            for poly in polygons {
                let mut rings = Vec::with_capacity(poly.len());
                for ring in poly {
                    for &i in ring {
                        let users = usage.entry(arc_ref(i).0).or_default();
                        if users.last() != Some(&feature_idx) {
                            users.push(feature_idx);
                        }
                    }
                    rings.push(stitch(ring, &arcs)?);
                }
                decoded.push(rings);
            }
            features.push(Feature {
                id,
                polygons: decoded,
            });
        }

        let mut shared: Vec<usize> = usage
            .into_iter()
            .filter(|(_, users)| users.len() > 1)
            .map(|(arc, _)| arc)
            .collect();
        shared.sort_unstable();
        let borders = shared
            .into_iter()
            .filter_map(|i| arcs.get(i).cloned())
            .collect();

        Ok(Boundary { features, borders })
    }
}

fn flatten<'a>(geom: &'a TopoGeometry, out: &mut Vec<&'a TopoGeometry>) {
    match geom {
        TopoGeometry::GeometryCollection { geometries } => {
            for g in geometries {
                flatten(g, out);
            }
        }
        other => out.push(other),
    }
}

// -----------------------------------------------------------------------------
// GeoJSON
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<GeoFeature>,
}

#[derive(Debug, Deserialize)]
struct GeoFeature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Value>,
    #[serde(default)]
    geometry: Option<GeoGeometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoGeometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

fn to_ring(coords: &[Vec<f64>]) -> Ring {
    coords
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| [p[0], p[1]])
        .collect()
}

impl FeatureCollection {
    fn into_boundary(self) -> Result<Boundary> {
        let mut features = Vec::with_capacity(self.features.len());
        for f in self.features {
            let polygons: Vec<Polygon> = match &f.geometry {
                Some(GeoGeometry::Polygon { coordinates }) => {
                    vec![coordinates.iter().map(|r| to_ring(r)).collect()]
                }
                Some(GeoGeometry::MultiPolygon { coordinates }) => coordinates
                    .iter()
                    .map(|poly| poly.iter().map(|r| to_ring(r)).collect())
                    .collect(),
                _ => continue,
            };
            features.push(Feature {
                id: FeatureId::from_json(f.id.as_ref(), f.properties.as_ref()),
                polygons,
            });
        }
        Ok(Boundary {
            features,
            borders: Vec::new(),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Two unit squares side by side sharing the arc `x = 1`, quantized with
    /// a transform, ids as FIPS strings (Alabama, Alaska) plus a third shape
    /// with an unknown id.
    pub const TWO_SQUARES: &str = r#"{
        "type": "Topology",
        "transform": { "scale": [1, 1], "translate": [0, 0] },
        "objects": {
            "states": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Polygon", "id": "01", "arcs": [[0, 1]] },
                    { "type": "Polygon", "id": "02", "arcs": [[2, -1]] },
                    { "type": "MultiPolygon", "id": "99", "arcs": [[[3]]] }
                ]
            }
        },
        "arcs": [
            [[1, 0], [0, 1]],
            [[1, 1], [-1, 0], [0, -1], [1, 0]],
            [[1, 0], [1, 0], [0, 1], [-1, 0]],
            [[5, 5], [1, 0], [0, 1], [-1, 0], [0, -1]]
        ]
    }"#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::TWO_SQUARES;
    use super::*;

    #[test]
    fn decodes_topology_with_transform() {
        let b = Boundary::from_slice(TWO_SQUARES.as_bytes(), "states").unwrap();
        assert_eq!(b.len(), 3);

        let left = &b.features[0];
        assert_eq!(left.id.id, Some(RawId::Text("01".into())));
        assert_eq!(
            left.polygons[0][0],
            vec![[1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0], [1.0, 0.0]]
        );

        let right = &b.features[1];
        assert_eq!(
            right.polygons[0][0],
            vec![[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 0.0]]
        );
    }

    #[test]
    fn shared_arcs_become_borders() {
        let b = Boundary::from_slice(TWO_SQUARES.as_bytes(), "states").unwrap();
        assert_eq!(b.borders, vec![vec![[1.0, 0.0], [1.0, 1.0]]]);
    }

    #[test]
    fn bounds_cover_all_shapes() {
        let b = Boundary::from_slice(TWO_SQUARES.as_bytes(), "states").unwrap();
        let bounds = b.bounds().unwrap();
        assert_eq!(bounds.min, [0.0, 0.0]);
        assert_eq!(bounds.max, [6.0, 6.0]);
    }

    #[test]
    fn missing_object_is_an_error() {
        let err = Boundary::from_slice(TWO_SQUARES.as_bytes(), "counties").unwrap_err();
        assert!(matches!(err, MapError::InvalidBoundary(_)));
        assert!(err.to_string().contains("states"));
    }

    #[test]
    fn decodes_geojson_names() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "id": 6, "properties": { "name": "California" },
                  "geometry": { "type": "Polygon",
                                "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] } },
                { "type": "Feature", "properties": { "NAME": "Texas" },
                  "geometry": { "type": "Point", "coordinates": [0, 0] } }
            ]
        }"#;
        let b = Boundary::from_slice(json.as_bytes(), "ignored").unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(b.features[0].id.name.as_deref(), Some("California"));
        assert_eq!(b.features[0].id.id, Some(RawId::Number(6)));
        assert!(b.borders.is_empty());
    }

    #[test]
    fn rejects_unknown_documents() {
        assert!(Boundary::from_slice(br#"{"type":"Feature"}"#, "states").is_err());
        assert!(Boundary::from_slice(br#"[1,2]"#, "states").is_err());
    }
}
