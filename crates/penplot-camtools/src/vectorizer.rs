//! Path Extractor
//!
//! Traces every border of the ink in a [`RasterMask`] into model-space
//! polylines using Suzuki-Abe border following, then simplifies each loop.

use crate::error::{check_range, CamToolResult, ParameterResult};
use crate::preprocess::RasterMask;
use crate::simplify::{
    dedup_consecutive, douglas_peucker, open_retraced, simplify_closed, traces_along,
};
use imageproc::contours::{find_contours, BorderType, Contour};
use penplot_core::{CoordinateSpace, PathSet, Point, Polyline};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default simplification tolerance as a fraction of loop length
pub const DEFAULT_SIMPLIFICATION_COEFF: f64 = 0.002;

/// Vectorization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizeParameters {
    /// Douglas-Peucker tolerance as a fraction of each loop's closed arc length
    pub simplification_coeff: f64,
    /// Draw thin strokes once: open border loops that walk out and back along a
    /// stroke, and skip hole borders lying on the pixels of their outer border
    pub collapse_retraced: bool,
}

impl Default for VectorizeParameters {
    fn default() -> Self {
        Self {
            simplification_coeff: DEFAULT_SIMPLIFICATION_COEFF,
            collapse_retraced: true,
        }
    }
}

impl VectorizeParameters {
    pub fn with_coeff(simplification_coeff: f64) -> Self {
        Self {
            simplification_coeff,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ParameterResult<()> {
        check_range("simplification_coeff", self.simplification_coeff, 0.0, 1.0)?;
        if self.simplification_coeff >= 1.0 {
            return Err(crate::error::ParameterError::InvalidValue {
                name: "simplification_coeff".to_string(),
                reason: "must be below 1.0".to_string(),
            });
        }
        Ok(())
    }
}

/// Trace `mask` into a model-space path set with default options
///
/// An all-paper mask yields an empty set.
pub fn extract(mask: &RasterMask, simplification_coeff: f64) -> CamToolResult<PathSet> {
    Vectorizer::new(VectorizeParameters::with_coeff(simplification_coeff)).extract(mask)
}

/// Border-following vectorizer
#[derive(Debug, Clone, Default)]
pub struct Vectorizer {
    params: VectorizeParameters,
}

impl Vectorizer {
    pub fn new(params: VectorizeParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &VectorizeParameters {
        &self.params
    }

    /// Trace and simplify every border loop, in raster-scan discovery order
    pub fn extract(&self, mask: &RasterMask) -> CamToolResult<PathSet> {
        self.params.validate()?;

        let contours: Vec<Contour<u32>> = find_contours(mask.as_gray());
        debug!("Traced {} borders", contours.len());
        let rings: Vec<Vec<Point>> = contours.iter().map(pixel_ring).collect();

        let mut paths = PathSet::new(CoordinateSpace::Model);
        let mut opened = 0usize;
        let mut doubled = 0usize;
        for (contour, ring) in contours.iter().zip(&rings) {
            if ring.len() < 2 {
                continue;
            }

            if self.params.collapse_retraced && matches!(contour.border_type, BorderType::Hole) {
                // The inside of a 1-pixel loop walks the same pixels as its outside
                if let Some(outer) = contour.parent.and_then(|i| rings.get(i)) {
                    if traces_along(ring, outer) {
                        doubled += 1;
                        continue;
                    }
                }
            }

            let closed_length: f64 = ring
                .windows(2)
                .map(|w| w[0].distance(w[1]))
                .sum::<f64>()
                + ring[ring.len() - 1].distance(ring[0]);
            let tolerance = self.params.simplification_coeff * closed_length;

            let retraced = if self.params.collapse_retraced {
                open_retraced(ring)
            } else {
                None
            };
            let points = match retraced {
                Some(open) => {
                    opened += 1;
                    douglas_peucker(&open, tolerance)
                }
                None => simplify_closed(ring, tolerance),
            };

            paths.push(Polyline::model(points));
        }

        info!(
            "Extracted {} paths ({} points, {} strokes opened, {} doubled holes skipped)",
            paths.len(),
            paths.point_count(),
            opened,
            doubled
        );
        Ok(paths)
    }
}

/// Border pixels as points, without repeats or a repeated end point
fn pixel_ring(contour: &Contour<u32>) -> Vec<Point> {
    let mut ring: Vec<Point> = contour
        .points
        .iter()
        .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
        .collect();
    dedup_consecutive(&mut ring);
    if ring.len() > 1 && ring[0] == ring[ring.len() - 1] {
        ring.pop();
    }
    ring
}
