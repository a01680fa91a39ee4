//! Path ordering
//!
//! Chooses the order in which polylines are drawn to keep pen-up travel short.
//! Orderers only permute the visiting order; a polyline is always drawn from
//! its first point to its last.

use penplot_core::{PathSet, Point, Polyline};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Largest path count the 2-opt pass is attempted on
pub const MAX_TWO_OPT_PATHS: usize = 600;

const MAX_TWO_OPT_PASSES: usize = 32;
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Strategy for ordering polylines
pub trait PathOrderer {
    /// Visiting order as indices into `paths`, starting with the pen at `start`
    fn order(&self, paths: &[Polyline], start: Point) -> Vec<usize>;
}

/// Greedy nearest-neighbor ordering
///
/// From the current pen position, pick the unvisited polyline whose start point
/// is closest, then continue from its end point. Ties go to the polyline that
/// appears first.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighbor;

impl PathOrderer for NearestNeighbor {
    fn order(&self, paths: &[Polyline], start: Point) -> Vec<usize> {
        let mut visited = vec![false; paths.len()];
        let mut order = Vec::with_capacity(paths.len());
        let mut pen = start;

        for _ in 0..paths.len() {
            let mut best: Option<(usize, f64)> = None;
            for (i, path) in paths.iter().enumerate() {
                if visited[i] {
                    continue;
                }
                let Some(s) = path.start() else { continue };
                let d = pen.distance_squared(s);
                if best.is_none_or(|(_, bd)| d < bd) {
                    best = Some((i, d));
                }
            }
            let Some((next, _)) = best else { break };
            visited[next] = true;
            order.push(next);
            if let Some(end) = paths[next].end() {
                pen = end;
            }
        }

        // Empty polylines never win a comparison; append them so the order
        // stays a permutation
        order.extend((0..paths.len()).filter(|&i| !visited[i]));
        order
    }
}

/// Nearest-neighbor followed by 2-opt refinement of the visiting order
///
/// Reverses segments of the visiting order while that strictly shortens total
/// travel. Sets above [`MAX_TWO_OPT_PATHS`] keep the greedy order.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborTwoOpt;

impl PathOrderer for NearestNeighborTwoOpt {
    fn order(&self, paths: &[Polyline], start: Point) -> Vec<usize> {
        let mut order = NearestNeighbor.order(paths, start);
        if order.len() < 3 {
            return order;
        }
        if order.len() > MAX_TWO_OPT_PATHS {
            debug!(
                "Skipping 2-opt for {} paths (limit {})",
                order.len(),
                MAX_TWO_OPT_PATHS
            );
            return order;
        }

        let greedy = order_travel(paths, &order, start);
        let n = order.len();
        let mut passes = 0;
        loop {
            let mut improved = false;
            for i in 0..n - 1 {
                for j in i + 1..n {
                    let before = span_travel(paths, &order, start, i, j);
                    order[i..=j].reverse();
                    let after = span_travel(paths, &order, start, i, j);
                    if after + IMPROVEMENT_EPSILON < before {
                        improved = true;
                    } else {
                        order[i..=j].reverse();
                    }
                }
            }
            passes += 1;
            if !improved || passes >= MAX_TWO_OPT_PASSES {
                break;
            }
        }

        debug!(
            "2-opt: travel {:.3} -> {:.3} in {} passes",
            greedy,
            order_travel(paths, &order, start),
            passes
        );
        order
    }
}

/// Selectable ordering strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingStrategy {
    /// Greedy nearest start point
    #[default]
    NearestNeighbor,
    /// Greedy, then 2-opt refinement
    TwoOpt,
}

impl fmt::Display for OrderingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NearestNeighbor => write!(f, "nearest_neighbor"),
            Self::TwoOpt => write!(f, "two_opt"),
        }
    }
}

impl PathOrderer for OrderingStrategy {
    fn order(&self, paths: &[Polyline], start: Point) -> Vec<usize> {
        match self {
            Self::NearestNeighbor => NearestNeighbor.order(paths, start),
            Self::TwoOpt => NearestNeighborTwoOpt.order(paths, start),
        }
    }
}

/// Reorder a path set with `orderer`, starting from `start`
pub fn order_paths(orderer: &dyn PathOrderer, paths: PathSet, start: Point) -> PathSet {
    let space = paths.space();
    let order = orderer.order(paths.polylines(), start);
    let mut slots: Vec<Option<Polyline>> = paths.into_polylines().into_iter().map(Some).collect();
    let ordered = order
        .into_iter()
        .filter_map(|i| slots.get_mut(i).and_then(Option::take))
        .collect();
    PathSet::from_polylines(space, ordered)
}

/// Pen-up distance to draw `paths` in their stored order from `start`
pub fn travel_distance(paths: &PathSet, start: Point) -> f64 {
    let order: Vec<usize> = (0..paths.len()).collect();
    order_travel(paths.polylines(), &order, start)
}

fn order_travel(paths: &[Polyline], order: &[usize], start: Point) -> f64 {
    if order.is_empty() {
        return 0.0;
    }
    span_travel(paths, order, start, 0, order.len() - 1)
}

/// Travel of the links entering positions `from..=to` and leaving `to`
fn span_travel(paths: &[Polyline], order: &[usize], start: Point, from: usize, to: usize) -> f64 {
    let last = (to + 1).min(order.len() - 1);
    (from..=last)
        .map(|k| {
            let prev_end = if k == 0 {
                Some(start)
            } else {
                paths[order[k - 1]].end()
            };
            match (prev_end, paths[order[k]].start()) {
                (Some(a), Some(b)) => a.distance(b),
                _ => 0.0,
            }
        })
        .sum()
}
