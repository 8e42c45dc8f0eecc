//! Failures of a measurement run

use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    ContourExtraction,
    ContourFilter,
    MarkerLocator,
    ScaleCalibrator,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::ContourExtraction => "contour extraction",
            Stage::ContourFilter => "contour filter",
            Stage::MarkerLocator => "marker locator",
            Stage::ScaleCalibrator => "scale calibrator",
        };
        f.write_str(name)
    }
}

/// Terminal failure of one measurement run. None of these are retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasureError {
    #[error("no colored objects detected in the image")]
    NoObjectsDetected,

    #[error("no valid shapes: all {extracted} extracted contours were rejected as noise")]
    NoValidShapes { extracted: usize },

    #[error("no reference marker found ({strategy} strategy): {reason}")]
    MarkerNotFound {
        strategy: &'static str,
        reason: String,
    },

    #[error("scale calibration failed: {0}")]
    CalibrationFailure(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MeasureError {
    pub fn stage(&self) -> Stage {
        match self {
            MeasureError::NoObjectsDetected => Stage::ContourExtraction,
            MeasureError::NoValidShapes { .. } => Stage::ContourFilter,
            MeasureError::MarkerNotFound { .. } => Stage::MarkerLocator,
            MeasureError::CalibrationFailure(_) => Stage::ScaleCalibrator,
            MeasureError::InvalidConfig(_) => Stage::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, MeasureError>;
