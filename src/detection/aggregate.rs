use crate::models::{Contour, MeasurementRecord, MeasurementResult};

/// Package the run's output, narrowest pipe first.
///
/// The sort is stable, so pipes of equal width keep their discovery order.
pub fn aggregate(
    marker: Contour,
    mut measurements: Vec<MeasurementRecord>,
    pixels_per_mm: f64,
) -> MeasurementResult {
    measurements.sort_by(|a, b| a.width_mm.total_cmp(&b.width_mm));
    MeasurementResult {
        marker,
        measurements,
        pixels_per_mm,
    }
}
