mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from pipemeasure for tests
pub use pipemeasure::{
    CategoryRange, CategoryTable, MarkerStrategy, MeasureError, MeasurementPipeline,
    MeasurementResult, PipelineConfig,
};
