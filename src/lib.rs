pub mod annotate;
pub mod config;
pub mod debug;
pub mod detection;
pub mod error;
pub mod models;

pub use config::{MarkerStrategy, PipelineConfig};
pub use debug::{DebugSink, DirectorySink, MemorySink};
pub use detection::MeasurementPipeline;
pub use detection::categories::{CategoryRange, CategoryTable};
pub use error::{MeasureError, Stage};
pub use models::{Contour, MeasurementRecord, MeasurementResult, RotatedRect};
