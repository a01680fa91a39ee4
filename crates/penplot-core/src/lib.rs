//! # penplot Core
//!
//! Geometry shared by every pipeline stage: points, polylines, path sets,
//! bounding boxes, the placement transform from model space onto the plotter
//! canvas, unit selection, and the geometry error type.

pub mod error;
pub mod geometry;
pub mod placement;
pub mod units;

pub use error::{GeometryError, Result};
pub use geometry::{BoundingBox, CoordinateSpace, PathSet, Point, Polyline, POINT_EPSILON};
pub use placement::{Placement, PlacementTransform};
pub use units::MeasurementSystem;
