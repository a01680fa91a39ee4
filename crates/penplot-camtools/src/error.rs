//! Error types for the toolpath stages.
//!
//! Every failure of the preprocessor, extractor, planner and pipeline is a
//! [`CamToolError`]. Callers that only need to branch on the failure class use
//! [`CamToolError::kind`].

use penplot_core::GeometryError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Caller-inspectable classification of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or corrupt file, unreadable image, malformed document, bad parameters.
    InvalidInput,
    /// Zero-extent bounding box, or an empty path set where output was required.
    DegenerateGeometry,
    /// A numeric computation produced a non-finite value.
    InternalTransformError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid input"),
            Self::DegenerateGeometry => write!(f, "degenerate geometry"),
            Self::InternalTransformError => write!(f, "internal transform error"),
        }
    }
}

/// Errors that can occur while turning an image into a motion program.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// The input artifact is missing, empty or unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The image could not be decoded or encoded.
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bounding box or transform failure.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// A file format error occurred.
    #[error("File format error: {0}")]
    FileFormat(#[from] FileFormatError),
}

impl CamToolError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Geometry(GeometryError::NonFinite { .. }) => ErrorKind::InternalTransformError,
            Self::Geometry(_) => ErrorKind::DegenerateGeometry,
            Self::InvalidInput(_)
            | Self::Image(_)
            | Self::Io(_)
            | Self::Parameter(_)
            | Self::FileFormat(_) => ErrorKind::InvalidInput,
        }
    }

    /// Create an invalid-input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Errors related to stage parameter validation.
#[derive(Error, Debug)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Errors related to path document parsing.
#[derive(Error, Debug)]
pub enum FileFormatError {
    /// The SVG document could not be parsed.
    #[error("SVG parse error: {0}")]
    SvgParseError(String),

    /// The file is empty or contains no usable data.
    #[error("Empty file: {0}")]
    EmptyFile(String),
}

/// Result type alias for stage operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;

/// Check that `value` is finite and inside `[min, max]`.
pub(crate) fn check_range(name: &str, value: f64, min: f64, max: f64) -> ParameterResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(ParameterError::OutOfRange {
            name: name.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}
