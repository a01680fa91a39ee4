//! Geometric primitives shared by every pipeline stage
//!
//! Points are `f64` pairs. Polylines and path sets carry the coordinate space
//! they live in so model-space (image pixels, Y down) and machine-space
//! (canvas length units, Y up) data cannot be mixed silently.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default tolerance used to decide whether two points coincide
pub const POINT_EPSILON: f64 = 1e-9;

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance, for comparisons
    pub fn distance_squared(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance
    pub fn distance(self, other: Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Whether both coordinates are finite
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Whether the two points are within `tolerance` of each other
    pub fn approx_eq(self, other: Point, tolerance: f64) -> bool {
        self.distance_squared(other) <= tolerance * tolerance
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Coordinate space a polyline is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    /// Raw pixel coordinates of the traced mask, Y pointing down
    #[default]
    Model,
    /// Physical canvas coordinates, Y pointing up
    Machine,
}

impl fmt::Display for CoordinateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Machine => write!(f, "machine"),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Box covering a single point
    pub fn from_point(p: Point) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    /// Box covering all points, `None` for an empty iterator
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::from_point(first);
        for p in iter {
            bbox.include(p);
        }
        Some(bbox)
    }

    /// Grow the box to contain `p`
    pub fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Zero width or zero height
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    /// Whether `p` lies inside the box, expanded by `tolerance`
    pub fn contains(&self, p: Point, tolerance: f64) -> bool {
        p.x >= self.min_x - tolerance
            && p.x <= self.max_x + tolerance
            && p.y >= self.min_y - tolerance
            && p.y <= self.max_y + tolerance
    }
}

/// An ordered sequence of points in one coordinate space
///
/// A polyline needs at least two points to be drawable. Closed polylines repeat
/// their first point at the end; closure is never stored separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    space: CoordinateSpace,
    points: Vec<Point>,
}

impl Polyline {
    pub fn new(space: CoordinateSpace, points: Vec<Point>) -> Self {
        Self { space, points }
    }

    /// Polyline in model space
    pub fn model(points: Vec<Point>) -> Self {
        Self::new(CoordinateSpace::Model, points)
    }

    /// Polyline in machine space
    pub fn machine(points: Vec<Point>) -> Self {
        Self::new(CoordinateSpace::Machine, points)
    }

    pub fn space(&self) -> CoordinateSpace {
        self.space
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// At least two points
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Sum of segment lengths
    pub fn arc_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    /// First and last point coincide within `tolerance` (needs 3+ points)
    pub fn is_closed(&self, tolerance: f64) -> bool {
        match (self.start(), self.end()) {
            (Some(a), Some(b)) if self.points.len() > 2 => a.approx_eq(b, tolerance),
            _ => false,
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points.iter().copied())
    }

    /// Apply `f` to every point, producing a polyline in `space`
    pub fn map_points<F, E>(&self, space: CoordinateSpace, mut f: F) -> Result<Polyline, E>
    where
        F: FnMut(Point) -> Result<Point, E>,
    {
        let points = self
            .points
            .iter()
            .map(|&p| f(p))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Polyline::new(space, points))
    }
}

/// Ordered collection of polylines in one coordinate space
///
/// The order is the draw order downstream. Polylines with fewer than two points
/// are never stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathSet {
    space: CoordinateSpace,
    polylines: Vec<Polyline>,
}

impl PathSet {
    /// Empty path set
    pub fn new(space: CoordinateSpace) -> Self {
        Self {
            space,
            polylines: Vec::new(),
        }
    }

    /// Build a set, dropping polylines that are not drawable
    pub fn from_polylines(space: CoordinateSpace, polylines: Vec<Polyline>) -> Self {
        let mut set = Self::new(space);
        for polyline in polylines {
            set.push(polyline);
        }
        set
    }

    /// Append a polyline; returns false if it was discarded
    ///
    /// The polyline is re-tagged with the set's coordinate space.
    pub fn push(&mut self, polyline: Polyline) -> bool {
        if !polyline.is_drawable() {
            return false;
        }
        debug_assert_eq!(polyline.space, self.space, "mixed coordinate spaces");
        self.polylines.push(Polyline {
            space: self.space,
            points: polyline.points,
        });
        true
    }

    pub fn space(&self) -> CoordinateSpace {
        self.space
    }

    pub fn len(&self) -> usize {
        self.polylines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    pub fn polylines(&self) -> &[Polyline] {
        &self.polylines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Polyline> {
        self.polylines.iter()
    }

    pub fn into_polylines(self) -> Vec<Polyline> {
        self.polylines
    }

    /// Total number of vertices across all polylines
    pub fn point_count(&self) -> usize {
        self.polylines.iter().map(Polyline::len).sum()
    }

    /// Sum of all polyline arc lengths
    pub fn total_length(&self) -> f64 {
        self.polylines.iter().map(Polyline::arc_length).sum()
    }

    /// Bounding box over every point, `None` when empty
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(
            self.polylines
                .iter()
                .flat_map(|p| p.points().iter().copied()),
        )
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a Polyline;
    type IntoIter = std::slice::Iter<'a, Polyline>;

    fn into_iter(self) -> Self::IntoIter {
        self.polylines.iter()
    }
}
