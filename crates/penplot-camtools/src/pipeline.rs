//! Toolpath pipeline
//!
//! Runs preprocess -> extract -> plan for one image. Every run owns its data;
//! nothing is shared between runs.

use crate::error::CamToolResult;
use crate::image_source::{GenerationRequest, ImageGenerator};
use crate::motion::MotionProgram;
use crate::planner::{plan, PlannerParameters};
use crate::preprocess::{PreprocessParameters, RasterMask, RasterPreprocessor};
use crate::svg::PathSetDocument;
use crate::vectorizer::{VectorizeParameters, Vectorizer};
use image::DynamicImage;
use penplot_core::{PathSet, Placement};
use std::path::Path;
use tracing::info;

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub mask: RasterMask,
    pub document: PathSetDocument,
    pub program: MotionProgram,
}

impl PipelineOutput {
    /// Model-space paths in draw order of extraction
    pub fn paths(&self) -> &PathSet {
        self.document.paths()
    }

    /// Path document as SVG text
    pub fn svg(&self) -> String {
        self.document.to_svg()
    }

    /// G-code text
    pub fn gcode(&self) -> String {
        self.program.render()
    }
}

/// Parameters for all three stages
#[derive(Debug, Clone, Default)]
pub struct ToolpathPipeline {
    pub preprocess: PreprocessParameters,
    pub vectorize: VectorizeParameters,
    pub planner: PlannerParameters,
}

impl ToolpathPipeline {
    pub fn new(
        preprocess: PreprocessParameters,
        vectorize: VectorizeParameters,
        planner: PlannerParameters,
    ) -> Self {
        Self {
            preprocess,
            vectorize,
            planner,
        }
    }

    /// Run every stage on a decoded image
    pub fn run(
        &self,
        image: &DynamicImage,
        placement: &Placement,
    ) -> CamToolResult<PipelineOutput> {
        let mask = RasterPreprocessor::new(self.preprocess.clone()).process(image)?;
        self.run_mask(mask, placement)
    }

    /// Run every stage on an image file
    pub fn run_file<P: AsRef<Path>>(
        &self,
        path: P,
        placement: &Placement,
    ) -> CamToolResult<PipelineOutput> {
        info!("Running pipeline on {}", path.as_ref().display());
        let mask = RasterPreprocessor::new(self.preprocess.clone()).process_file(path)?;
        self.run_mask(mask, placement)
    }

    /// Ask `generator` for an image, then run every stage on it
    pub fn run_with_generator(
        &self,
        generator: &dyn ImageGenerator,
        request: &GenerationRequest,
        placement: &Placement,
    ) -> CamToolResult<PipelineOutput> {
        let image = generator.generate(request)?.load()?;
        self.run(&image, placement)
    }

    /// Extract and plan from an existing mask
    pub fn run_mask(
        &self,
        mask: RasterMask,
        placement: &Placement,
    ) -> CamToolResult<PipelineOutput> {
        let paths = Vectorizer::new(self.vectorize.clone()).extract(&mask)?;
        let program = plan(&paths, placement, &self.planner)?;
        let document =
            PathSetDocument::new(f64::from(mask.width()), f64::from(mask.height()), paths);
        Ok(PipelineOutput {
            mask,
            document,
            program,
        })
    }
}
