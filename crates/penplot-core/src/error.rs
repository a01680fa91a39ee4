//! Error handling for penplot geometry
//!
//! Geometry errors are raised by bounding-box and placement computations and
//! are wrapped by the stage crates. All error types use `thiserror`.

use thiserror::Error;

/// Geometry error type
///
/// Represents failures of the numeric geometry layer: shapes that cannot be
/// scaled and arithmetic that escaped the finite range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The bounding box has zero extent along at least one axis
    #[error("Degenerate bounding box: {width} x {height}")]
    DegenerateBoundingBox {
        /// Width of the box in model units.
        width: f64,
        /// Height of the box in model units.
        height: f64,
    },

    /// A computation produced or received a non-finite value
    #[error("Non-finite value in {context}")]
    NonFinite {
        /// Where the value was encountered.
        context: String,
    },

    /// An operation required at least one polyline
    #[error("Path set is empty")]
    EmptyPathSet,
}

impl GeometryError {
    /// Create a non-finite error for the given context
    pub fn non_finite(context: impl Into<String>) -> Self {
        GeometryError::NonFinite {
            context: context.into(),
        }
    }

    /// Check if this error describes unusable geometry (as opposed to a numeric fault)
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            GeometryError::DegenerateBoundingBox { .. } | GeometryError::EmptyPathSet
        )
    }
}

/// Result type using GeometryError
pub type Result<T> = std::result::Result<T, GeometryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_display() {
        let err = GeometryError::DegenerateBoundingBox {
            width: 0.0,
            height: 12.5,
        };
        assert_eq!(err.to_string(), "Degenerate bounding box: 0 x 12.5");

        let err = GeometryError::non_finite("scale_x");
        assert_eq!(err.to_string(), "Non-finite value in scale_x");
    }

    #[test]
    fn test_is_degenerate() {
        assert!(GeometryError::EmptyPathSet.is_degenerate());
        assert!(GeometryError::DegenerateBoundingBox {
            width: 1.0,
            height: 0.0
        }
        .is_degenerate());
        assert!(!GeometryError::non_finite("rotation").is_degenerate());
    }
}
