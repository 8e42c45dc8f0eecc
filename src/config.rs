//! Tunable parameters of the measurement pipeline.
//!
//! Every section has defaults matching the standard red-pipe setup, so a
//! config file only needs to name what it changes.

use crate::detection::categories::CategoryTable;
use crate::error::{MeasureError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inclusive bounds on 8-bit H (0-180), S and V
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

/// Red wraps around hue 0, so it takes two ranges
pub const RED_RANGES: [HsvRange; 2] = [
    HsvRange::new([0, 30, 30], [15, 255, 255]),
    HsvRange::new([160, 30, 30], [180, 255, 255]),
];

pub const GREEN_RANGES: [HsvRange; 1] = [HsvRange::new([40, 40, 40], [80, 255, 255])];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// A pixel is foreground if it falls in any of these
    pub ranges: Vec<HsvRange>,
    /// Radius of the square opening/closing kernel (2 = 5x5)
    pub morph_radius: u8,
    /// Radius of the median filter window (2 = 5x5)
    pub median_radius: u32,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            ranges: RED_RANGES.to_vec(),
            morph_radius: 2,
            median_radius: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourFilterConfig {
    /// Contours enclosing less than this many square pixels are noise
    pub min_area: f64,
    pub use_solidity: bool,
    /// Contours with solidity at or below this are rejected
    pub min_solidity: f64,
    /// Polygon approximation tolerance as a fraction of the perimeter
    pub approx_epsilon: f64,
    pub min_vertices: usize,
    pub max_vertices: usize,
}

impl Default for ContourFilterConfig {
    fn default() -> Self {
        Self {
            min_area: 100.0,
            use_solidity: true,
            min_solidity: 0.7,
            approx_epsilon: 0.02,
            min_vertices: 4,
            max_vertices: 14,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extremum {
    Smallest,
    Largest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeExtremumParams {
    pub extremum: Extremum,
}

impl Default for SizeExtremumParams {
    fn default() -> Self {
        Self {
            extremum: Extremum::Smallest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeHeuristicParams {
    /// Polygon approximation tolerance as a fraction of the perimeter
    pub approx_epsilon: f64,
    pub min_vertices: usize,
    pub max_vertices: usize,
    /// Accepted bounding box width/height band
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Area over bounding box area must exceed this
    pub min_extent: f64,
}

impl Default for ShapeHeuristicParams {
    fn default() -> Self {
        Self {
            approx_epsilon: 0.04,
            min_vertices: 3,
            max_vertices: 6,
            min_aspect: 0.5,
            max_aspect: 1.5,
            min_extent: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistinctColorParams {
    pub ranges: Vec<HsvRange>,
    /// The largest marker-colored region must enclose at least this area
    pub min_area: f64,
}

impl Default for DistinctColorParams {
    fn default() -> Self {
        Self {
            ranges: GREEN_RANGES.to_vec(),
            min_area: 1000.0,
        }
    }
}

/// How the reference marker is told apart from the pipes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerStrategy {
    /// The marker is the smallest (or largest) colored object
    SizeExtremum(SizeExtremumParams),
    /// The marker is the near-square quadrilateral; median area wins ties
    ShapeHeuristic(ShapeHeuristicParams),
    /// The marker has its own color and is segmented separately
    DistinctColor(DistinctColorParams),
}

impl Default for MarkerStrategy {
    fn default() -> Self {
        MarkerStrategy::ShapeHeuristic(ShapeHeuristicParams::default())
    }
}

impl MarkerStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            MarkerStrategy::SizeExtremum(_) => "size extremum",
            MarkerStrategy::ShapeHeuristic(_) => "shape heuristic",
            MarkerStrategy::DistinctColor(_) => "distinct color",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Physical side length of the reference marker, in meters
    pub marker_length_m: f64,
    pub color: ColorConfig,
    pub filter: ContourFilterConfig,
    pub marker: MarkerStrategy,
    pub categories: CategoryTable,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            marker_length_m: 1.0,
            color: ColorConfig::default(),
            filter: ContourFilterConfig::default(),
            marker: MarkerStrategy::default(),
            categories: CategoryTable::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn with_marker_length(mut self, marker_length_m: f64) -> Self {
        self.marker_length_m = marker_length_m;
        self
    }

    pub fn with_marker_strategy(mut self, strategy: MarkerStrategy) -> Self {
        self.marker = strategy;
        self
    }

    pub fn with_categories(mut self, categories: CategoryTable) -> Self {
        self.categories = categories;
        self
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if !self.marker_length_m.is_finite() || self.marker_length_m <= 0.0 {
            return Err(invalid(format!(
                "marker length must be a positive number of meters, got {}",
                self.marker_length_m
            )));
        }
        validate_ranges("color", &self.color.ranges)?;

        let f = &self.filter;
        if f.min_vertices > f.max_vertices {
            return Err(invalid(format!(
                "filter vertex range {}..={} is empty",
                f.min_vertices, f.max_vertices
            )));
        }
        if !(f.approx_epsilon > 0.0) {
            return Err(invalid("filter approximation epsilon must be positive".to_string()));
        }

        match &self.marker {
            MarkerStrategy::SizeExtremum(_) => {}
            MarkerStrategy::ShapeHeuristic(p) => {
                if p.min_vertices > p.max_vertices || p.min_aspect > p.max_aspect {
                    return Err(invalid("shape heuristic bounds are inverted".to_string()));
                }
                if !(p.approx_epsilon > 0.0) {
                    return Err(invalid("marker approximation epsilon must be positive".to_string()));
                }
            }
            MarkerStrategy::DistinctColor(p) => validate_ranges("marker color", &p.ranges)?,
        }

        self.categories.validate()
    }
}

fn validate_ranges(what: &str, ranges: &[HsvRange]) -> Result<()> {
    if ranges.is_empty() {
        return Err(invalid(format!("{what} ranges are empty")));
    }
    for range in ranges {
        if (0..3).any(|c| range.lower[c] > range.upper[c]) {
            return Err(invalid(format!(
                "{what} range {:?}..{:?} has a lower bound above its upper bound",
                range.lower, range.upper
            )));
        }
    }
    Ok(())
}

fn invalid(message: String) -> MeasureError {
    MeasureError::InvalidConfig(message)
}
