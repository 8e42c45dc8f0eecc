use anyhow::Context;
use clap::{Parser, ValueEnum};
use image::ImageReader;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pipemeasure::config::{DistinctColorParams, Extremum, ShapeHeuristicParams, SizeExtremumParams};
use pipemeasure::{
    DebugSink, DirectorySink, MarkerStrategy, MeasureError, MeasurementPipeline, PipelineConfig,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    /// Near-square quadrilateral of the pipe color
    Shape,
    /// Smallest colored object
    Smallest,
    /// Largest colored object
    Largest,
    /// Separately colored (green) marker
    Color,
}

impl Strategy {
    fn into_marker_strategy(self) -> MarkerStrategy {
        match self {
            Strategy::Shape => MarkerStrategy::ShapeHeuristic(ShapeHeuristicParams::default()),
            Strategy::Smallest => MarkerStrategy::SizeExtremum(SizeExtremumParams {
                extremum: Extremum::Smallest,
            }),
            Strategy::Largest => MarkerStrategy::SizeExtremum(SizeExtremumParams {
                extremum: Extremum::Largest,
            }),
            Strategy::Color => MarkerStrategy::DistinctColor(DistinctColorParams::default()),
        }
    }
}

#[derive(Parser)]
#[command(name = "pipemeasure")]
#[command(about = "Measure red pipes in construction site images")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Known side length of the marker in meters
    #[arg(long, value_name = "METERS")]
    marker_length: Option<f64>,

    /// How the reference marker is recognized
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// JSON file with pipeline settings (flags override it)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a copy of the image with marker and pipes outlined
    #[arg(long, value_name = "FILE")]
    annotate_out: Option<PathBuf>,

    /// Save intermediate masks to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<MeasureError>() {
            Some(measure) => {
                eprintln!("Error ({}): {}", measure.stage(), measure);
                ExitCode::from(1)
            }
            None => {
                eprintln!("Error: {:#}", e);
                ExitCode::from(2)
            }
        },
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "warn,pipemeasure=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Cli) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(length) = args.marker_length {
        config = config.with_marker_length(length);
    }
    if let Some(strategy) = args.strategy {
        config = config.with_marker_strategy(strategy.into_marker_strategy());
    }
    let pipeline = MeasurementPipeline::new(config)?;

    info!("Loading image: {}", args.image_path.display());

    // Load image
    let img = ImageReader::open(&args.image_path)
        .with_context(|| format!("Failed to open {}", args.image_path.display()))?
        .decode()
        .map_err(|e| anyhow::anyhow!("Could not read the image: {}", e))?
        .to_rgb8();

    info!("Image loaded: {}x{}", img.width(), img.height());

    let sink = args.debug_out.clone().map(DirectorySink::new).transpose()?;
    let result = pipeline.measure_with_debug(&img, sink.as_ref().map(|s| s as &dyn DebugSink))?;

    if let Some(path) = &args.annotate_out {
        pipemeasure::annotate::render(&img, &result)
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to save annotated image: {}", e))?;
        info!("Annotated image saved to {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("=== Pipe Measurements ===");
    println!("Scale: {:.4} px/mm", result.pixels_per_mm);
    if result.measurements.is_empty() {
        println!("No pipes found besides the marker.");
    }
    for (i, pipe) in result.measurements.iter().enumerate() {
        println!(
            "Pipe {}: width {:.1} mm, length {:.2} m, category {} (complexity {:.3})",
            i + 1,
            pipe.width_mm,
            pipe.length_m,
            pipe.category,
            pipe.shape_complexity
        );
    }

    Ok(())
}
