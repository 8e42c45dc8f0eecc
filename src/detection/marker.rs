//! Reference marker selection.
//!
//! Which object in the frame is the marker is a deployment decision, so each
//! rule is a separate `MarkerLocator` chosen from `MarkerStrategy`.

use crate::config::{
    ColorConfig, DistinctColorParams, Extremum, MarkerStrategy, ShapeHeuristicParams,
    SizeExtremumParams,
};
use crate::detection::color::HsvImage;
use crate::detection::contours::extract_contours;
use crate::detection::preprocessing::build_mask;
use crate::error::{MeasureError, Result};
use crate::models::Contour;
use image::GrayImage;
use tracing::debug;

/// Outcome of marker selection
#[derive(Debug, Clone)]
pub struct MarkerSelection {
    pub marker: Contour,
    /// Pipe candidates in discovery order, marker excluded
    pub pipes: Vec<Contour>,
    /// Contours that qualified as marker before the final pick
    pub candidates: Vec<Contour>,
    /// Mask the marker was segmented from, when it differs from the pipe mask
    pub marker_mask: Option<GrayImage>,
}

pub trait MarkerLocator: Send + Sync {
    /// Pick the marker from the filtered shapes (or from the image itself)
    fn locate(&self, hsv: &HsvImage, shapes: Vec<Contour>) -> Result<MarkerSelection>;

    fn name(&self) -> &'static str;
}

/// Build the locator for a configured strategy
pub fn locator_for(strategy: &MarkerStrategy, color: &ColorConfig) -> Box<dyn MarkerLocator> {
    match strategy {
        MarkerStrategy::SizeExtremum(p) => Box::new(SizeExtremumLocator { params: p.clone() }),
        MarkerStrategy::ShapeHeuristic(p) => Box::new(ShapeHeuristicLocator { params: p.clone() }),
        MarkerStrategy::DistinctColor(p) => Box::new(DistinctColorLocator {
            params: p.clone(),
            morph_radius: color.morph_radius,
            median_radius: color.median_radius,
        }),
    }
}

fn not_found(strategy: &'static str, reason: impl Into<String>) -> MeasureError {
    MeasureError::MarkerNotFound {
        strategy,
        reason: reason.into(),
    }
}

/// The marker is known to be the smallest or the largest colored object
pub struct SizeExtremumLocator {
    pub params: SizeExtremumParams,
}

impl MarkerLocator for SizeExtremumLocator {
    fn locate(&self, _hsv: &HsvImage, mut shapes: Vec<Contour>) -> Result<MarkerSelection> {
        let areas: Vec<f64> = shapes.iter().map(Contour::area).collect();

        // strict comparison: the earliest contour wins ties
        let mut best: Option<usize> = None;
        for (i, area) in areas.iter().enumerate() {
            let better = match best {
                None => true,
                Some(b) => match self.params.extremum {
                    Extremum::Smallest => *area < areas[b],
                    Extremum::Largest => *area > areas[b],
                },
            };
            if better {
                best = Some(i);
            }
        }

        let pos = best.ok_or_else(|| not_found(self.name(), "there are no shapes to choose from"))?;
        let marker = shapes.remove(pos);
        debug!("Marker is contour {} with area {:.0}", marker.index, areas[pos]);

        Ok(MarkerSelection {
            candidates: vec![marker.clone()],
            marker,
            pipes: shapes,
            marker_mask: None,
        })
    }

    fn name(&self) -> &'static str {
        "size extremum"
    }
}

/// The marker is a near-square quadrilateral
pub struct ShapeHeuristicLocator {
    pub params: ShapeHeuristicParams,
}

impl ShapeHeuristicLocator {
    pub fn is_candidate(&self, contour: &Contour) -> bool {
        let p = &self.params;
        let vertices = contour.approximate(p.approx_epsilon).len();
        if vertices < p.min_vertices || vertices > p.max_vertices {
            return false;
        }
        let aspect = contour.aspect_ratio();
        if aspect < p.min_aspect || aspect > p.max_aspect {
            return false;
        }
        contour.extent() > p.min_extent
    }
}

impl MarkerLocator for ShapeHeuristicLocator {
    fn locate(&self, _hsv: &HsvImage, mut shapes: Vec<Contour>) -> Result<MarkerSelection> {
        let mut positions: Vec<usize> = (0..shapes.len())
            .filter(|&i| self.is_candidate(&shapes[i]))
            .collect();
        if positions.is_empty() {
            return Err(not_found(
                self.name(),
                format!("none of {} shapes is a near-square quadrilateral", shapes.len()),
            ));
        }

        // median area among candidates, so neither a pipe end nor a fragment wins
        positions.sort_by(|&a, &b| shapes[a].area().total_cmp(&shapes[b].area()));
        let pos = positions[positions.len() / 2];
        debug!(
            "{} marker candidates, picked contour {} (median area)",
            positions.len(),
            shapes[pos].index
        );

        positions.sort_unstable();
        let candidates = positions.iter().map(|&i| shapes[i].clone()).collect();
        let marker = shapes.remove(pos);

        Ok(MarkerSelection {
            marker,
            pipes: shapes,
            candidates,
            marker_mask: None,
        })
    }

    fn name(&self) -> &'static str {
        "shape heuristic"
    }
}

/// The marker has its own color; it is segmented from a separate mask and the
/// pipe shapes are left untouched
pub struct DistinctColorLocator {
    pub params: DistinctColorParams,
    pub morph_radius: u8,
    pub median_radius: u32,
}

impl MarkerLocator for DistinctColorLocator {
    fn locate(&self, hsv: &HsvImage, shapes: Vec<Contour>) -> Result<MarkerSelection> {
        let color = ColorConfig {
            ranges: self.params.ranges.clone(),
            morph_radius: self.morph_radius,
            median_radius: self.median_radius,
        };
        let mask = build_mask(hsv, &color);
        let regions = extract_contours(&mask);

        let mut largest: Option<(usize, f64)> = None;
        for (i, region) in regions.iter().enumerate() {
            let area = region.area();
            if largest.is_none_or(|(_, best)| area > best) {
                largest = Some((i, area));
            }
        }

        let (pos, area) = largest
            .ok_or_else(|| not_found(self.name(), "no pixels of the marker color"))?;
        if area < self.params.min_area {
            return Err(not_found(
                self.name(),
                format!(
                    "largest marker-colored region has area {:.0}, below the minimum {:.0}",
                    area, self.params.min_area
                ),
            ));
        }
        debug!("Marker region area {:.0} out of {} marker-colored regions", area, regions.len());

        let marker = regions[pos].clone();
        Ok(MarkerSelection {
            candidates: regions,
            marker,
            pipes: shapes,
            marker_mask: Some(mask),
        })
    }

    fn name(&self) -> &'static str {
        "distinct color"
    }
}
