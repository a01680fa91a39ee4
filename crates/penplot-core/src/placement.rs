//! Placement of model-space geometry on the physical canvas
//!
//! Model space is the traced image: pixel units, Y pointing down. Machine space
//! is the plotter canvas: placement units, Y pointing up. The transform applies
//! exactly one Y inversion, right after centering, so a drawing never comes out
//! mirrored.
//!
//! Per point, in order:
//! 1. translate so the model bounding-box center is the origin
//! 2. invert Y
//! 3. scale by `(width / bbox_width, height / bbox_height)`
//! 4. rotate by `rotation_deg` clockwise (standard matrix with the negated angle)
//! 5. translate by `(x + width / 2, y + height / 2)`
//!
//! Unrotated, the drawing fills `[x, x + width] x [y, y + height]` and the top
//! edge of the image lands on `y + height`.

use crate::error::{GeometryError, Result};
use crate::geometry::{BoundingBox, Point};
use nalgebra::{Matrix3, Point2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Caller-requested position, size and rotation of the drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Left edge of the target box
    pub x_mm: f64,
    /// Lower edge of the target box (machine Y is up)
    pub y_mm: f64,
    /// Target width
    pub width_mm: f64,
    /// Target height
    pub height_mm: f64,
    /// Rotation about the drawing's own center, degrees, clockwise-positive
    #[serde(default)]
    pub rotation_deg: f64,
}

impl Placement {
    /// Unrotated placement
    pub fn new(x_mm: f64, y_mm: f64, width_mm: f64, height_mm: f64) -> Self {
        Self {
            x_mm,
            y_mm,
            width_mm,
            height_mm,
            rotation_deg: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation_deg: f64) -> Self {
        self.rotation_deg = rotation_deg;
        self
    }

    /// Center of the target box
    pub fn center(&self) -> Point {
        Point::new(
            self.x_mm + self.width_mm / 2.0,
            self.y_mm + self.height_mm / 2.0,
        )
    }

    /// All fields must be finite
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("x_mm", self.x_mm),
            ("y_mm", self.y_mm),
            ("width_mm", self.width_mm),
            ("height_mm", self.height_mm),
            ("rotation_deg", self.rotation_deg),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(GeometryError::non_finite(format!("placement {}", name)));
            }
        }
        Ok(())
    }
}

/// Affine map from a model bounding box onto a placement
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementTransform {
    matrix: Matrix3<f64>,
    scale_x: f64,
    scale_y: f64,
}

impl PlacementTransform {
    /// Build the transform mapping `bbox` onto `placement`
    ///
    /// Fails with [`GeometryError::DegenerateBoundingBox`] when the box has zero
    /// width or height, and with [`GeometryError::NonFinite`] when any input or
    /// derived factor is not finite.
    pub fn fit(bbox: &BoundingBox, placement: &Placement) -> Result<Self> {
        placement.validate()?;

        let (width, height) = (bbox.width(), bbox.height());
        if !width.is_finite() || !height.is_finite() {
            return Err(GeometryError::non_finite("bounding box"));
        }
        if bbox.is_degenerate() {
            return Err(GeometryError::DegenerateBoundingBox { width, height });
        }

        let scale_x = placement.width_mm / width;
        let scale_y = placement.height_mm / height;
        if !scale_x.is_finite() || !scale_y.is_finite() {
            return Err(GeometryError::non_finite("scale factors"));
        }

        let center = bbox.center();
        let target = placement.center();

        let to_origin = Matrix3::new_translation(&Vector2::new(-center.x, -center.y));
        let flip_y = Matrix3::new_nonuniform_scaling(&Vector2::new(1.0, -1.0));
        let scale = Matrix3::new_nonuniform_scaling(&Vector2::new(scale_x, scale_y));
        let rotate = Matrix3::new_rotation(-placement.rotation_deg.to_radians());
        let to_target = Matrix3::new_translation(&Vector2::new(target.x, target.y));

        let matrix = to_target * rotate * scale * flip_y * to_origin;

        debug!(
            scale_x,
            scale_y,
            rotation_deg = placement.rotation_deg,
            "Placement transform fitted"
        );

        Ok(Self {
            matrix,
            scale_x,
            scale_y,
        })
    }

    /// Map a model point into machine space
    pub fn apply(&self, p: Point) -> Result<Point> {
        if !p.is_finite() {
            return Err(GeometryError::non_finite(format!("model point {}", p)));
        }
        let mapped = self.matrix.transform_point(&Point2::new(p.x, p.y));
        let out = Point::new(mapped.x, mapped.y);
        if !out.is_finite() {
            return Err(GeometryError::non_finite(format!("transformed point {}", p)));
        }
        Ok(out)
    }

    /// Scale factors `(x, y)` from model units to placement units
    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }
}
