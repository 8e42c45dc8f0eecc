pub mod aggregate;
pub mod calibration;
pub mod categories;
pub mod color;
pub mod contours;
pub mod marker;
pub mod measure;
pub mod preprocessing;

use crate::annotate::{MARKER_COLOR, PIPE_COLOR, CANDIDATE_COLOR, overlay_on_mask};
use crate::config::PipelineConfig;
use crate::debug::DebugSink;
use crate::error::Result;
use crate::models::{MeasurementRecord, MeasurementResult};
use image::{DynamicImage, GrayImage, RgbImage};
use marker::{MarkerLocator, locator_for};
use tracing::{debug, info, warn};

/// Measurement pipeline: mask, contours, marker, scale, sizes, categories.
///
/// Holds configuration only. Every run builds its own mask and contour lists
/// and drops them when it returns, so one pipeline can serve concurrent calls.
pub struct MeasurementPipeline {
    config: PipelineConfig,
    locator: Box<dyn MarkerLocator>,
}

impl MeasurementPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let locator = locator_for(&config.marker, &config.color);
        Ok(Self { config, locator })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Cleaned binary mask of the pipe color
    pub fn build_mask(&self, image: &RgbImage) -> GrayImage {
        let hsv = color::to_hsv(image);
        preprocessing::build_mask(&hsv, &self.config.color)
    }

    /// Measure every pipe in the image
    pub fn measure(&self, image: &RgbImage) -> Result<MeasurementResult> {
        self.measure_with_debug(image, None)
    }

    /// Measure, handing intermediate images to `debug` when one is given
    pub fn measure_with_debug(
        &self,
        image: &RgbImage,
        debug: Option<&dyn DebugSink>,
    ) -> Result<MeasurementResult> {
        debug!("Measuring {}x{} image", image.width(), image.height());

        // Step 1: color mask
        let hsv = color::to_hsv(image);
        let mask = preprocessing::build_mask(&hsv, &self.config.color);
        debug!("Mask covers {} pixels", preprocessing::coverage(&mask));
        emit(debug, "01_color_mask", "mask.png", || DynamicImage::ImageLuma8(mask.clone()));

        // Step 2: contours
        let shapes = contours::find_shapes(&mask, &self.config.filter)?;
        emit(debug, "02_contours", "filtered.png", || {
            DynamicImage::ImageRgb8(overlay_on_mask(&mask, &[(shapes.as_slice(), PIPE_COLOR)]))
        });

        // Step 3: marker
        let selection = self.locator.locate(&hsv, shapes)?;
        emit(debug, "03_marker", "marker.png", || {
            let base = selection.marker_mask.as_ref().unwrap_or(&mask);
            DynamicImage::ImageRgb8(overlay_on_mask(
                base,
                &[
                    (selection.candidates.as_slice(), CANDIDATE_COLOR),
                    (std::slice::from_ref(&selection.marker), MARKER_COLOR),
                ],
            ))
        });
        if let Some(marker_mask) = &selection.marker_mask {
            emit(debug, "03_marker", "marker_mask.png", || {
                DynamicImage::ImageLuma8(marker_mask.clone())
            });
        }

        // Step 4: scale
        let pixels_per_mm =
            calibration::pixels_per_mm(&selection.marker, self.config.marker_length_m)?;
        info!(
            "Calibrated {:.4} px/mm from marker {} ({} strategy)",
            pixels_per_mm,
            selection.marker.index,
            self.locator.name()
        );

        // Steps 5-6: measure and categorize
        let measurements: Vec<MeasurementRecord> = selection
            .pipes
            .into_iter()
            .map(|contour| {
                let size = measure::measure_pipe(&contour, pixels_per_mm);
                let category = self.config.categories.categorize(size.width_mm).to_string();
                debug!(
                    "Pipe {}: {:.1} mm x {:.2} m, {}",
                    contour.index, size.width_mm, size.length_m, category
                );
                MeasurementRecord {
                    contour,
                    width_mm: size.width_mm,
                    length_m: size.length_m,
                    category,
                    shape_complexity: size.shape_complexity,
                }
            })
            .collect();

        // Step 7: package
        let result = aggregate::aggregate(selection.marker, measurements, pixels_per_mm);
        info!("Measured {} pipes", result.measurements.len());
        Ok(result)
    }
}

impl Default for MeasurementPipeline {
    fn default() -> Self {
        let config = PipelineConfig::default();
        let locator = locator_for(&config.marker, &config.color);
        Self { config, locator }
    }
}

/// Hand an image to the sink; a failing sink never fails the measurement
fn emit(debug: Option<&dyn DebugSink>, stage: &str, name: &str, render: impl FnOnce() -> DynamicImage) {
    if let Some(sink) = debug {
        if let Err(e) = sink.save(stage, name, &render()) {
            warn!("Could not save debug image {}/{}: {:#}", stage, name, e);
        }
    }
}
