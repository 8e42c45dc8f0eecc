use crate::config::ContourFilterConfig;
use crate::error::{MeasureError, Result};
use crate::models::Contour;
use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use std::collections::HashMap;
use tracing::debug;

/// Trace the outer boundary of every connected foreground region.
///
/// Hole borders are dropped; an outer boundary nested inside another region's
/// hole keeps that region's index as its `parent`.
pub fn extract_contours(mask: &GrayImage) -> Vec<Contour> {
    let traced = find_contours::<i32>(mask);

    let mut outer_index: HashMap<usize, usize> = HashMap::new();
    for (i, c) in traced.iter().enumerate() {
        if c.border_type == BorderType::Outer {
            let next = outer_index.len();
            outer_index.insert(i, next);
        }
    }
    let holes = traced.len() - outer_index.len();
    if holes > 0 {
        debug!("Skipping {} hole borders", holes);
    }

    traced
        .iter()
        .enumerate()
        .filter(|(_, c)| c.border_type == BorderType::Outer)
        .map(|(i, c)| {
            // outer -> enclosing hole -> the region owning that hole
            let parent = c
                .parent
                .and_then(|hole| traced[hole].parent)
                .and_then(|owner| outer_index.get(&owner).copied());
            Contour {
                index: outer_index[&i],
                points: c.points.clone(),
                parent,
            }
        })
        .collect()
}

/// Why a contour was dropped by the filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    TooSmall { area: f64 },
    Concave { solidity: f64 },
    VertexCount { vertices: usize },
}

/// Check one contour against the filter policy, in order: noise floor,
/// solidity, approximated vertex count
pub fn check_contour(contour: &Contour, config: &ContourFilterConfig) -> std::result::Result<(), Rejection> {
    let area = contour.area();
    if area < config.min_area {
        return Err(Rejection::TooSmall { area });
    }

    if config.use_solidity {
        let solidity = contour.solidity();
        if solidity <= config.min_solidity {
            return Err(Rejection::Concave { solidity });
        }
    }

    let vertices = contour.approximate(config.approx_epsilon).len();
    if vertices < config.min_vertices || vertices > config.max_vertices {
        return Err(Rejection::VertexCount { vertices });
    }

    Ok(())
}

/// Keep the contours that look like a pipe or marker silhouette, preserving
/// discovery order
pub fn filter_contours(contours: Vec<Contour>, config: &ContourFilterConfig) -> Vec<Contour> {
    contours
        .into_iter()
        .filter(|c| match check_contour(c, config) {
            Ok(()) => true,
            Err(reason) => {
                debug!("Rejected contour {}: {:?}", c.index, reason);
                false
            }
        })
        .collect()
}

/// Extract and filter, failing when nothing usable remains
pub fn find_shapes(mask: &GrayImage, config: &ContourFilterConfig) -> Result<Vec<Contour>> {
    let all = extract_contours(mask);
    if all.is_empty() {
        return Err(MeasureError::NoObjectsDetected);
    }
    let extracted = all.len();
    debug!("Found {} contours", extracted);

    let shapes = filter_contours(all, config);
    if shapes.is_empty() {
        return Err(MeasureError::NoValidShapes { extracted });
    }
    debug!("{} of {} contours passed the shape filter", shapes.len(), extracted);
    Ok(shapes)
}
