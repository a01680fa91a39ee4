//! # penplot CAM Tools
//!
//! The toolpath generation stages that turn line-art images into pen-plotter
//! G-code.
//!
//! ## Stages
//!
//! - **Raster Preprocessor**: luminance, blur, Otsu threshold, morphology and thinning
//! - **Path Extractor**: border following, Douglas-Peucker simplification, SVG documents
//! - **Toolpath Planner**: short-path filter, travel ordering, placement, G-code emission
//!
//! ## Supporting Infrastructure
//!
//! - **Pipeline**: runs the three stages for one image
//! - **Image Source**: prompt-to-image abstraction used to feed the pipeline
//! - **Optimizer**: nearest-neighbor and 2-opt path ordering

pub mod error;
pub mod image_source;
pub mod motion;
pub mod optimizer;
pub mod pipeline;
pub mod planner;
pub mod preprocess;
pub mod simplify;
pub mod svg;
pub mod vectorizer;

pub use error::{
    CamToolError, CamToolResult, ErrorKind, FileFormatError, ParameterError, ParameterResult,
};
pub use image_source::{
    compose_prompt, Complexity, GenerationRequest, ImageGenerator, ImageRef,
    StaticImageGenerator, PLOTTER_SYSTEM_PROMPT,
};
pub use motion::{MotionCommand, MotionProgram, ProgramStatistics};
pub use optimizer::{
    order_paths, travel_distance, NearestNeighbor, NearestNeighborTwoOpt, OrderingStrategy,
    PathOrderer,
};
pub use pipeline::{PipelineOutput, ToolpathPipeline};
pub use planner::{filter_short_paths, plan, plan_with_progress, transform_paths, PlannerParameters};
pub use preprocess::{
    preprocess, preprocess_bytes, preprocess_file, PreprocessParameters, RasterMask,
    RasterPreprocessor,
};
pub use svg::PathSetDocument;
pub use vectorizer::{extract, VectorizeParameters, Vectorizer, DEFAULT_SIMPLIFICATION_COEFF};
