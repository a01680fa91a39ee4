//! Image sources
//!
//! The pipeline only needs "a raster image for this prompt". [`ImageGenerator`]
//! is that capability; real providers live outside this crate, and
//! [`StaticImageGenerator`] serves fixed images for fixtures and tests.

use crate::error::{CamToolError, CamToolResult};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Instructions prepended to every prompt so generated images trace cleanly
pub const PLOTTER_SYSTEM_PROMPT: &str = "\
You generate images for a pen plotter; every image will be vectorized and drawn with a single pen.
Use pure black lines on an absolutely white (#FFFFFF) background, with no grey levels and no anti-aliasing.
Draw clean, thin, sharp contour lines that are clearly separated from each other.
Never use shading, gradients, shadows, textures or 3D effects.";

/// Requested level of detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Simple,
    Complex,
}

impl Complexity {
    /// Style line appended to the prompt
    pub fn preset(self) -> &'static str {
        match self {
            Self::Simple => {
                "Style: extremely minimalist line art with only a few essential lines and no fine detail."
            }
            Self::Complex => {
                "Style: intricate, highly detailed line art with complex patterns and many fine lines, in a professional plotter illustration style."
            }
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Complex => write!(f, "complex"),
        }
    }
}

/// A prompt plus its detail level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub complexity: Complexity,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            complexity: Complexity::default(),
        }
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }
}

/// Full text sent to a provider: system prompt, user prompt, style preset
pub fn compose_prompt(request: &GenerationRequest) -> String {
    format!(
        "{}\n\n{}\n\n{}",
        PLOTTER_SYSTEM_PROMPT,
        request.prompt.trim(),
        request.complexity.preset()
    )
}

/// Where a generated image can be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Encoded image data
    Bytes(Vec<u8>),
    /// Image file on disk
    Path(PathBuf),
}

impl ImageRef {
    /// Decode the referenced image
    pub fn load(&self) -> CamToolResult<DynamicImage> {
        match self {
            Self::Bytes(bytes) => {
                if bytes.is_empty() {
                    return Err(CamToolError::invalid_input("generated image is empty"));
                }
                Ok(image::load_from_memory(bytes)?)
            }
            Self::Path(path) => {
                if !path.is_file() {
                    return Err(CamToolError::invalid_input(format!(
                        "Image not found: {}",
                        path.display()
                    )));
                }
                Ok(image::open(path)?)
            }
        }
    }
}

/// Produces a raster image from a text prompt
pub trait ImageGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> CamToolResult<ImageRef>;
}

/// Generator returning the same image for every prompt
#[derive(Debug, Clone)]
pub struct StaticImageGenerator {
    image: ImageRef,
}

impl StaticImageGenerator {
    pub fn new(image: ImageRef) -> Self {
        Self { image }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(ImageRef::Bytes(bytes))
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(ImageRef::Path(path.into()))
    }
}

impl ImageGenerator for StaticImageGenerator {
    fn generate(&self, request: &GenerationRequest) -> CamToolResult<ImageRef> {
        if request.prompt.trim().is_empty() {
            return Err(CamToolError::invalid_input("prompt is empty"));
        }
        debug!(
            complexity = %request.complexity,
            "Serving static image for prompt: {}",
            request.prompt
        );
        Ok(self.image.clone())
    }
}
