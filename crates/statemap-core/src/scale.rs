// crates/statemap-core/src/scale.rs

//! Color domains and the three interchangeable "number → color" encodings.

use crate::error::{MapError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 8-bit sRGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Linear interpolation, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(
            mix(self.0, other.0),
            mix(self.1, other.1),
            mix(self.2, other.2),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = MapError;

    /// Parses `#rrggbb` or `#rgb`.
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        let bad = || MapError::InvalidConfig(format!("invalid color '{s}'"));
        if !hex.is_ascii() {
            return Err(bad());
        }
        let byte = |h: &str| u8::from_str_radix(h, 16).map_err(|_| bad());
        match hex.len() {
            6 => Ok(Rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
            3 => {
                let d = |i: usize| byte(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Rgb(d(0)?, d(1)?, d(2)?))
            }
            _ => Err(bad()),
        }
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

const fn hex(v: u32) -> Rgb {
    Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

/// Six-class sequential ColorBrewer schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Reds,
    Blues,
    Greens,
    Oranges,
    Purples,
}

impl Scheme {
    pub fn colors(&self) -> [Rgb; 6] {
        match self {
            Scheme::Reds => [
                hex(0xfee5d9),
                hex(0xfcbba1),
                hex(0xfc9272),
                hex(0xfb6a4a),
                hex(0xde2d26),
                hex(0xa50f15),
            ],
            Scheme::Blues => [
                hex(0xeff3ff),
                hex(0xc6dbef),
                hex(0x9ecae1),
                hex(0x6baed6),
                hex(0x3182bd),
                hex(0x08519c),
            ],
            Scheme::Greens => [
                hex(0xedf8e9),
                hex(0xc7e9c0),
                hex(0xa1d99b),
                hex(0x74c476),
                hex(0x31a354),
                hex(0x006d2c),
            ],
            Scheme::Oranges => [
                hex(0xfeedde),
                hex(0xfdd0a2),
                hex(0xfdae6b),
                hex(0xfd8d3c),
                hex(0xe6550d),
                hex(0xa63603),
            ],
            Scheme::Purples => [
                hex(0xf2f0f7),
                hex(0xdadaeb),
                hex(0xbcbddc),
                hex(0x9e9ac8),
                hex(0x756bb1),
                hex(0x54278f),
            ],
        }
    }
}

impl FromStr for Scheme {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reds" => Ok(Scheme::Reds),
            "blues" => Ok(Scheme::Blues),
            "greens" => Ok(Scheme::Greens),
            "oranges" => Ok(Scheme::Oranges),
            "purples" => Ok(Scheme::Purples),
            other => Err(MapError::InvalidConfig(format!("unknown scheme '{other}'"))),
        }
    }
}

/// Numeric range mapped onto a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorDomain {
    pub min: f64,
    pub max: f64,
}

impl ColorDomain {
    /// Min and max over `values`; `None` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Self { min: v, max: v }),
            Some(d) => Some(Self {
                min: d.min.min(v),
                max: d.max.max(v),
            }),
        })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Position of `v` in the domain, clamped to `[0, 1]`. A degenerate
    /// domain puts everything at or above `max` at the top.
    pub fn normalize(&self, v: f64) -> f64 {
        if self.span() <= 0.0 {
            return if v >= self.max { 1.0 } else { 0.0 };
        }
        ((v - self.min) / self.span()).clamp(0.0, 1.0)
    }
}

/// Which bounds a render uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DomainMode {
    /// `[0, max]`.
    #[default]
    ZeroToMax,
    /// `[min, max]`.
    MinToMax,
    /// Explicit breakpoints; only meaningful with [`ScaleKind::Threshold`].
    Breakpoints { breaks: Vec<f64> },
}

impl DomainMode {
    /// Bounds for this mode given the observed values.
    pub fn domain(&self, observed: Option<ColorDomain>) -> Option<ColorDomain> {
        match self {
            DomainMode::ZeroToMax => observed.map(|d| ColorDomain {
                min: 0.0_f64.min(d.min),
                max: d.max,
            }),
            DomainMode::MinToMax => observed,
            DomainMode::Breakpoints { breaks } => {
                ColorDomain::from_values(breaks.iter().copied()).or(observed)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    #[default]
    Quantize,
    Threshold,
    Sequential,
}

impl FromStr for ScaleKind {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quantize" => Ok(ScaleKind::Quantize),
            "threshold" => Ok(ScaleKind::Threshold),
            "sequential" => Ok(ScaleKind::Sequential),
            other => Err(MapError::InvalidConfig(format!("unknown scale '{other}'"))),
        }
    }
}

fn non_empty(range: &[Rgb]) -> Result<()> {
    if range.is_empty() {
        Err(MapError::InvalidConfig("color range is empty".into()))
    } else {
        Ok(())
    }
}

/// Maps a value to a color. The top of the domain maps to the last color.
pub trait ColorScale: fmt::Debug {
    fn color(&self, value: f64) -> Rgb;

    /// Upper bounds of each color bucket, for legends.
    fn buckets(&self) -> Vec<(f64, Rgb)>;
}

/// Equal-width buckets over the domain.
#[derive(Debug, Clone)]
pub struct Quantize {
    domain: ColorDomain,
    range: Vec<Rgb>,
}

impl Quantize {
    /// Fails on an empty `range`.
    pub fn new(domain: ColorDomain, range: Vec<Rgb>) -> Result<Self> {
        non_empty(&range)?;
        Ok(Self { domain, range })
    }
}

impl ColorScale for Quantize {
    fn color(&self, value: f64) -> Rgb {
        let n = self.range.len();
        let t = self.domain.normalize(value);
        let idx = ((t * n as f64).floor() as usize).min(n - 1);
        self.range[idx]
    }

    fn buckets(&self) -> Vec<(f64, Rgb)> {
        let n = self.range.len() as f64;
        self.range
            .iter()
            .enumerate()
            .map(|(i, c)| (self.domain.min + self.domain.span() * (i + 1) as f64 / n, *c))
            .collect()
    }
}

/// Explicit breakpoints: `breaks.len() + 1` colors, `value >= break[i]`
/// moves to bucket `i + 1`.
#[derive(Debug, Clone)]
pub struct Threshold {
    breaks: Vec<f64>,
    range: Vec<Rgb>,
}

impl Threshold {
    /// Uses the first `breaks.len() + 1` colors of `range` (or every color,
    /// with the remaining breaks dropped when `range` is short). Fails on an
    /// empty `range`.
    pub fn new(mut breaks: Vec<f64>, range: &[Rgb]) -> Result<Self> {
        non_empty(range)?;
        breaks.retain(|b| b.is_finite());
        breaks.sort_by(|a, b| a.total_cmp(b));
        breaks.dedup();
        breaks.truncate(range.len() - 1);
        let range = range[..breaks.len() + 1].to_vec();
        Ok(Self { breaks, range })
    }

    /// `n - 1` evenly spaced breaks over `domain` for `n` colors.
    ///
    /// A degenerate domain gets a single break at `max`: values below it take
    /// the first color, `max` and above take the last.
    pub fn evenly(domain: ColorDomain, range: &[Rgb]) -> Result<Self> {
        non_empty(range)?;
        let n = range.len();
        if domain.span() <= 0.0 && n > 1 {
            return Ok(Self {
                breaks: vec![domain.max],
                range: vec![range[0], range[n - 1]],
            });
        }
        let breaks = (1..n)
            .map(|i| domain.min + domain.span() * i as f64 / n as f64)
            .collect();
        Self::new(breaks, range)
    }

    pub fn breaks(&self) -> &[f64] {
        &self.breaks
    }
}

impl ColorScale for Threshold {
    fn color(&self, value: f64) -> Rgb {
        let idx = self.breaks.partition_point(|b| *b <= value);
        self.range[idx]
    }

    fn buckets(&self) -> Vec<(f64, Rgb)> {
        self.breaks
            .iter()
            .copied()
            .chain(std::iter::once(f64::INFINITY))
            .zip(self.range.iter().copied())
            .collect()
    }
}

/// Continuous interpolation through the scheme's colors.
#[derive(Debug, Clone)]
pub struct Sequential {
    domain: ColorDomain,
    stops: Vec<Rgb>,
}

impl Sequential {
    /// Fails on an empty `stops`.
    pub fn new(domain: ColorDomain, stops: Vec<Rgb>) -> Result<Self> {
        non_empty(&stops)?;
        Ok(Self { domain, stops })
    }
}

impl ColorScale for Sequential {
    fn color(&self, value: f64) -> Rgb {
        let t = self.domain.normalize(value);
        let segments = self.stops.len() - 1;
        if segments == 0 {
            return self.stops[0];
        }
        let pos = t * segments as f64;
        let i = (pos.floor() as usize).min(segments - 1);
        self.stops[i].lerp(self.stops[i + 1], pos - i as f64)
    }

    fn buckets(&self) -> Vec<(f64, Rgb)> {
        let n = self.stops.len().max(2) - 1;
        (0..=n)
            .map(|i| {
                let v = self.domain.min + self.domain.span() * i as f64 / n as f64;
                (v, self.color(v))
            })
            .collect()
    }
}

/// Builds the configured scale for `domain`.
pub fn build_scale(
    kind: ScaleKind,
    mode: &DomainMode,
    domain: ColorDomain,
    scheme: Scheme,
) -> Result<Box<dyn ColorScale>> {
    let colors = scheme.colors();
    Ok(match (kind, mode) {
        (ScaleKind::Threshold, DomainMode::Breakpoints { breaks }) => {
            Box::new(Threshold::new(breaks.clone(), &colors)?)
        }
        (ScaleKind::Threshold, _) => Box::new(Threshold::evenly(domain, &colors)?),
        (ScaleKind::Quantize, _) => Box::new(Quantize::new(domain, colors.to_vec())?),
        (ScaleKind::Sequential, _) => Box::new(Sequential::new(domain, colors.to_vec())?),
    })
}
