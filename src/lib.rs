//! # penplot
//!
//! Turns raster line-art images into G-code for 2D pen plotters.
//!
//! ## Architecture
//!
//! penplot is organized as a workspace with multiple crates:
//!
//! 1. **penplot-core** - Points, polylines, path sets, bounding boxes, placement transform
//! 2. **penplot-camtools** - Preprocessor, path extractor, toolpath planner, pipeline
//! 3. **penplot-settings** - Configuration file (JSON/TOML)
//! 4. **penplot** - Command-line binary, artifact naming, logging
//!
//! ## Pipeline
//!
//! - **Preprocess**: grayscale, blur, Otsu threshold, morphology, Zhang-Suen thinning
//! - **Vectorize**: border following and Douglas-Peucker simplification to an SVG path document
//! - **Plan**: short-path filtering, nearest-neighbor ordering, placement, G-code emission

pub mod artifacts;

pub use penplot_camtools::{
    extract, plan, preprocess, CamToolError, CamToolResult, Complexity, ErrorKind,
    GenerationRequest, ImageGenerator, ImageRef, MotionCommand, MotionProgram, OrderingStrategy,
    PathSetDocument, PipelineOutput, PlannerParameters, PreprocessParameters, ProgramStatistics,
    RasterMask, StaticImageGenerator, ToolpathPipeline, VectorizeParameters,
};
pub use penplot_core::{
    BoundingBox, CoordinateSpace, GeometryError, MeasurementSystem, PathSet, Placement, Point,
    Polyline,
};
pub use penplot_settings::{Config, OutputSettings, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line human-readable output
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// Newline-delimited JSON
    Json,
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty formatting on stderr
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with(LogFormat::default())
}

/// Initialize logging in the given format
///
/// Events go to stderr so G-code written to stdout stays clean. Defaults to
/// `info` unless `RUST_LOG` says otherwise.
pub fn init_logging_with(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .try_init()?,
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_thread_names(true)
                    .json(),
            )
            .try_init()?,
    }

    Ok(())
}
