use crate::error::{MeasureError, Result};
use crate::models::Contour;

/// Pixel size of the marker side, averaged from two estimates: the mean side
/// of its minimum-area rectangle, and a quarter of its perimeter (valid for a
/// square marker). Averaging softens a poor rectangle fit.
///
/// The perimeter is walked along the pixel edges, the same whole-pixel
/// convention the rectangle uses, so rounded corners do not shorten it. A
/// tilted side walks as a staircase and is scaled back by the grid factor.
pub fn marker_side_pixels(marker: &Contour) -> Result<f64> {
    let area = marker.area();
    let perimeter = marker.perimeter();
    if area <= 0.0 || perimeter <= 0.0 {
        return Err(MeasureError::CalibrationFailure(format!(
            "marker contour is degenerate (area {area:.1}, perimeter {perimeter:.1})"
        )));
    }

    let rect = marker.min_area_rect();
    let (short, long) = rect.sides();
    let rect_estimate = (short + long) / 2.0;
    let perimeter_estimate = marker.outline_length() / rect.grid_factor() / 4.0;

    Ok((rect_estimate + perimeter_estimate) / 2.0)
}

/// Pixels per millimeter from the marker and its physical side length
pub fn pixels_per_mm(marker: &Contour, marker_length_m: f64) -> Result<f64> {
    let side_px = marker_side_pixels(marker)?;
    scale_from_side(side_px, marker_length_m)
}

fn scale_from_side(side_px: f64, marker_length_m: f64) -> Result<f64> {
    let scale = side_px / (marker_length_m * 1000.0);
    if !scale.is_finite() || scale <= 0.0 {
        return Err(MeasureError::CalibrationFailure(format!(
            "scale of {scale} px/mm from a {side_px:.1} px marker of {marker_length_m} m"
        )));
    }
    Ok(scale)
}
