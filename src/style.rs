use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::feed::EarthquakeFeature;

/// Marker radius per unit of magnitude.
pub const DEFAULT_SCALE_FACTOR: f64 = 4.0;

/// Errors raised while building a depth scale.
#[derive(Debug, Error, PartialEq)]
pub enum ScaleError {
    #[error("depth scale `{0}` has no buckets")]
    Empty(String),
    #[error("depth scale `{name}` has a non-finite lower bound at bucket {index}")]
    NonFiniteBound { name: String, index: usize },
    #[error("depth scale `{name}` is not strictly ascending at bucket {index} ({bound} <= {previous})")]
    NotAscending {
        name: String,
        index: usize,
        previous: f64,
        bound: f64,
    },
    #[error("invalid color token `{0}`, expected #rrggbb")]
    BadColor(String),
}

/// A `#rrggbb` fill color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorToken(String);

impl ColorToken {
    pub fn new(hex: &str) -> Result<Self, ScaleError> {
        let digits = hex.strip_prefix('#').unwrap_or_default();
        if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(hex.to_ascii_lowercase()))
        } else {
            Err(ScaleError::BadColor(hex.to_string()))
        }
    }

    /// For literals known to be well formed.
    pub(crate) fn from_static(hex: &'static str) -> Self {
        debug_assert!(Self::new(hex).is_ok(), "bad color literal {hex}");
        Self(hex.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ColorToken {
    type Error = ScaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ColorToken> for String {
    fn from(token: ColorToken) -> Self {
        token.0
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A depth range starting at `lower_bound_km` (inclusive) and running up to
/// the next bucket's bound.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DepthBucket {
    pub lower_bound_km: f64,
    pub color: ColorToken,
}

#[derive(Deserialize)]
struct RawScale {
    name: String,
    below: ColorToken,
    buckets: Vec<DepthBucket>,
}

/// Ordered bucket table covering every depth.
///
/// Depths under the first bound take `below`; the last bucket catches
/// everything from its bound upward.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawScale")]
pub struct DepthScale {
    name: String,
    below: ColorToken,
    buckets: Vec<DepthBucket>,
}

impl TryFrom<RawScale> for DepthScale {
    type Error = ScaleError;

    fn try_from(raw: RawScale) -> Result<Self, Self::Error> {
        DepthScale::new(raw.name, raw.below, raw.buckets)
    }
}

impl DepthScale {
    pub fn new(
        name: impl Into<String>,
        below: ColorToken,
        buckets: Vec<DepthBucket>,
    ) -> Result<Self, ScaleError> {
        let name = name.into();
        if buckets.is_empty() {
            return Err(ScaleError::Empty(name));
        }
        for (index, bucket) in buckets.iter().enumerate() {
            if !bucket.lower_bound_km.is_finite() {
                return Err(ScaleError::NonFiniteBound { name, index });
            }
            if index > 0 {
                let previous = buckets[index - 1].lower_bound_km;
                if bucket.lower_bound_km <= previous {
                    return Err(ScaleError::NotAscending {
                        name,
                        index,
                        previous,
                        bound: bucket.lower_bound_km,
                    });
                }
            }
        }
        Ok(Self {
            name,
            below,
            buckets,
        })
    }

    /// Seven colors over six thresholds, used by the single-layer and layered maps.
    pub fn fine() -> Self {
        Self::builtin(
            "fine",
            "#00ff00",
            &[
                (-10.0, "#33cc33"),
                (10.0, "#ffff00"),
                (30.0, "#ffcc00"),
                (50.0, "#ff9933"),
                (70.0, "#ff6600"),
                (90.0, "#ff0000"),
            ],
        )
    }

    /// Four colors over three thresholds.
    pub fn coarse() -> Self {
        Self::builtin(
            "coarse",
            "#00ff00",
            &[(10.0, "#ccff00"), (30.0, "#ffff00"), (50.0, "#ff0000")],
        )
    }

    fn builtin(name: &str, below: &'static str, table: &[(f64, &'static str)]) -> Self {
        // Built-in tables are literals that satisfy every check in `new`.
        Self {
            name: name.to_string(),
            below: ColorToken::from_static(below),
            buckets: table
                .iter()
                .map(|&(lower_bound_km, color)| DepthBucket {
                    lower_bound_km,
                    color: ColorToken::from_static(color),
                })
                .collect(),
        }
    }

    /// Look up a built-in scale by name.
    pub fn named(name: &str) -> Option<Self> {
        match name {
            "fine" => Some(Self::fine()),
            "coarse" => Some(Self::coarse()),
            _ => None,
        }
    }

    /// Load and validate a scale from a JSON file.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read depth scale {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse depth scale {}", path.display()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn below(&self) -> &ColorToken {
        &self.below
    }

    pub fn buckets(&self) -> &[DepthBucket] {
        &self.buckets
    }
}

/// Radius and fill color for one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleResult {
    pub radius: f64,
    pub color: ColorToken,
}

/// Maps magnitude to marker radius and depth to fill color.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleResolver {
    scale: DepthScale,
    scale_factor: f64,
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::new(DepthScale::fine(), DEFAULT_SCALE_FACTOR)
    }
}

impl StyleResolver {
    pub fn new(scale: DepthScale, scale_factor: f64) -> Self {
        Self {
            scale,
            scale_factor,
        }
    }

    pub fn scale(&self) -> &DepthScale {
        &self.scale
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// `magnitude * scale_factor`, unclamped.
    pub fn resolve_radius(&self, magnitude: f64) -> f64 {
        magnitude * self.scale_factor
    }

    /// Color of the bucket containing `depth_km`.
    ///
    /// Each threshold is an exclusive upper bound for the color before it.
    /// NaN fails every comparison and lands in the last bucket.
    pub fn resolve_color(&self, depth_km: f64) -> &ColorToken {
        let mut current = &self.scale.below;
        for bucket in &self.scale.buckets {
            if depth_km < bucket.lower_bound_km {
                return current;
            }
            current = &bucket.color;
        }
        current
    }

    pub fn style(&self, feature: &EarthquakeFeature) -> StyleResult {
        StyleResult {
            radius: self.resolve_radius(feature.magnitude),
            color: self.resolve_color(feature.depth_km).clone(),
        }
    }
}
