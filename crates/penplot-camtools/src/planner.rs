//! Toolpath Planner
//!
//! Turns a model-space [`PathSet`] into a [`MotionProgram`] in one pass:
//! filter short paths, order them, map them onto the placement, emit commands.

use crate::error::{check_range, CamToolError, CamToolResult, ParameterResult};
use crate::motion::{MotionCommand, MotionProgram};
use crate::optimizer::{order_paths, OrderingStrategy};
use penplot_core::{
    CoordinateSpace, GeometryError, MeasurementSystem, PathSet, Placement, PlacementTransform,
    Point,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Planner parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerParameters {
    /// Pen-down feed rate (units/min)
    pub draw_speed: f64,
    /// Pen-up feed rate (units/min)
    pub travel_speed: f64,
    /// Z height with the pen lifted
    pub pen_up_z: f64,
    /// Z height with the pen on the paper
    pub pen_down_z: f64,
    /// Paths shorter than this (model units) are skipped; the bound is inclusive
    pub min_path_length: f64,
    /// Path ordering heuristic
    pub ordering: OrderingStrategy,
    /// Units the placement and feed rates are given in
    pub units: MeasurementSystem,
}

impl Default for PlannerParameters {
    fn default() -> Self {
        Self {
            draw_speed: 1200.0,
            travel_speed: 3000.0,
            pen_up_z: 5.0,
            pen_down_z: 0.0,
            min_path_length: 0.3,
            ordering: OrderingStrategy::NearestNeighbor,
            units: MeasurementSystem::Metric,
        }
    }
}

impl PlannerParameters {
    pub fn validate(&self) -> ParameterResult<()> {
        check_range("draw_speed", self.draw_speed, f64::MIN_POSITIVE, 100_000.0)?;
        check_range("travel_speed", self.travel_speed, f64::MIN_POSITIVE, 100_000.0)?;
        check_range("pen_up_z", self.pen_up_z, -1000.0, 1000.0)?;
        check_range("pen_down_z", self.pen_down_z, -1000.0, 1000.0)?;
        check_range("min_path_length", self.min_path_length, 0.0, f64::MAX)?;
        Ok(())
    }
}

/// Keep polylines whose arc length is at least `min_length`
pub fn filter_short_paths(paths: &PathSet, min_length: f64) -> PathSet {
    let kept = paths
        .iter()
        .filter(|p| p.arc_length() >= min_length)
        .cloned()
        .collect();
    PathSet::from_polylines(paths.space(), kept)
}

/// Map a model-space set onto `placement`
///
/// Fails with a degenerate-geometry error for an empty set or a set whose
/// bounding box has zero width or height.
pub fn transform_paths(paths: &PathSet, placement: &Placement) -> CamToolResult<PathSet> {
    let transform = fit_transform(paths, placement)?;
    let mut machine = PathSet::new(CoordinateSpace::Machine);
    for polyline in paths {
        machine.push(polyline.map_points(CoordinateSpace::Machine, |p| transform.apply(p))?);
    }
    Ok(machine)
}

fn fit_transform(paths: &PathSet, placement: &Placement) -> CamToolResult<PlacementTransform> {
    if paths.space() != CoordinateSpace::Model {
        return Err(CamToolError::invalid_input(format!(
            "expected model-space paths, got {}",
            paths.space()
        )));
    }
    let bbox = paths.bounding_box().ok_or(GeometryError::EmptyPathSet)?;
    Ok(PlacementTransform::fit(&bbox, placement)?)
}

/// Plan `paths` onto `placement`
pub fn plan(
    paths: &PathSet,
    placement: &Placement,
    params: &PlannerParameters,
) -> CamToolResult<MotionProgram> {
    plan_with_progress(paths, placement, params, |_| {})
}

/// Plan with a progress callback receiving values in `0.0..=1.0`
///
/// An empty set, before or after filtering, yields only the preamble and the
/// final home command.
pub fn plan_with_progress<F>(
    paths: &PathSet,
    placement: &Placement,
    params: &PlannerParameters,
    mut progress_callback: F,
) -> CamToolResult<MotionProgram>
where
    F: FnMut(f32),
{
    params.validate()?;
    placement.validate()?;
    if paths.space() != CoordinateSpace::Model {
        return Err(CamToolError::invalid_input(format!(
            "expected model-space paths, got {}",
            paths.space()
        )));
    }
    progress_callback(0.0);

    let filtered = filter_short_paths(paths, params.min_path_length);
    debug!(
        "Filtered {} of {} paths shorter than {}",
        paths.len() - filtered.len(),
        paths.len(),
        params.min_path_length
    );

    let mut program = MotionProgram::new(params.units, params.draw_speed, params.travel_speed);
    program.push(MotionCommand::Units(params.units));
    program.push(MotionCommand::AbsolutePositioning);
    program.push(MotionCommand::PenUp { z: params.pen_up_z });

    if filtered.is_empty() {
        program.push(MotionCommand::Home);
        progress_callback(1.0);
        info!("No drawable paths; emitted empty program");
        return Ok(program);
    }

    let ordered = order_paths(&params.ordering, filtered, Point::ORIGIN);
    progress_callback(0.1);

    let transform = fit_transform(&ordered, placement)?;
    let total = ordered.len();

    for (index, polyline) in ordered.iter().enumerate() {
        let machine = polyline.map_points(CoordinateSpace::Machine, |p| transform.apply(p))?;
        let mut points = machine.points().iter().copied();
        let Some(first) = points.next() else {
            continue;
        };

        program.push(MotionCommand::Travel {
            to: first,
            feed: params.travel_speed,
        });
        program.push(MotionCommand::PenDown {
            z: params.pen_down_z,
        });
        for to in points {
            program.push(MotionCommand::Draw {
                to,
                feed: params.draw_speed,
            });
        }
        program.push(MotionCommand::PenUp { z: params.pen_up_z });

        progress_callback(0.1 + 0.9 * (index + 1) as f32 / total as f32);
    }

    program.push(MotionCommand::Home);
    progress_callback(1.0);

    let stats = program.statistics();
    info!(
        "Planned {} paths ({} draw moves, {:.1} draw, {:.1} travel, ~{:.0}s) using {}",
        stats.path_count,
        program.draw_count(),
        stats.draw_distance,
        stats.travel_distance,
        stats.estimated_seconds,
        params.ordering
    );
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use penplot_core::Polyline;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn model_set(lines: Vec<Vec<Point>>) -> PathSet {
        PathSet::from_polylines(
            CoordinateSpace::Model,
            lines.into_iter().map(Polyline::model).collect(),
        )
    }

    #[test]
    fn test_filter_boundary_is_inclusive() {
        let set = model_set(vec![
            vec![p(0.0, 0.0), p(0.2, 0.0)],
            vec![p(0.0, 1.0), p(0.3, 1.0)],
            vec![p(0.0, 2.0), p(0.4, 2.0)],
        ]);
        let kept = filter_short_paths(&set, 0.3);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.polylines()[0].end(), Some(p(0.3, 1.0)));
        assert_eq!(kept.polylines()[1].end(), Some(p(0.4, 2.0)));
    }

    #[test]
    fn test_empty_set_gives_preamble_and_home() {
        let program = plan(
            &PathSet::new(CoordinateSpace::Model),
            &Placement::new(0.0, 0.0, 100.0, 100.0),
            &PlannerParameters::default(),
        )
        .unwrap();
        assert_eq!(program.draw_count(), 0);
        assert_eq!(
            program.render(),
            "G21 ; Set units to mm\nG90 ; Absolute positioning\nG0 Z5.00 ; Pen up\nG28 ; Home\n"
        );
    }

    #[test]
    fn test_degenerate_box_is_rejected() {
        let params = PlannerParameters {
            min_path_length: 0.0,
            ..Default::default()
        };
        let set = model_set(vec![vec![p(3.0, 3.0), p(3.0, 3.0), p(3.0, 3.0)]]);
        let err = plan(&set, &Placement::new(0.0, 0.0, 10.0, 10.0), &params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateGeometry);

        let flat = model_set(vec![vec![p(0.0, 4.0), p(5.0, 4.0)]]);
        let err = plan(&flat, &Placement::new(0.0, 0.0, 10.0, 10.0), &params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateGeometry);
    }

    #[test]
    fn test_non_finite_rotation_is_transform_error() {
        let set = model_set(vec![vec![p(0.0, 0.0), p(4.0, 4.0)]]);
        let placement = Placement::new(0.0, 0.0, 10.0, 10.0).with_rotation(f64::INFINITY);
        let err = plan(&set, &placement, &PlannerParameters::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalTransformError);
    }

    #[test]
    fn test_emits_travel_pen_down_draws_pen_up_per_path() {
        let set = model_set(vec![
            vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)],
            vec![p(2.0, 8.0), p(4.0, 8.0)],
        ]);
        let program = plan(
            &set,
            &Placement::new(5.0, 5.0, 20.0, 20.0),
            &PlannerParameters::default(),
        )
        .unwrap();

        let expected = "\
G21 ; Set units to mm
G90 ; Absolute positioning
G0 Z5.00 ; Pen up
G0 X5.00 Y25.00 F3000
G1 Z0.00 ; Pen down
G1 X25.00 Y25.00 F1200
G1 X25.00 Y5.00 F1200
G0 Z5.00 ; Pen up
G0 X9.00 Y9.00 F3000
G1 Z0.00 ; Pen down
G1 X13.00 Y9.00 F1200
G0 Z5.00 ; Pen up
G28 ; Home
";
        assert_eq!(program.render(), expected);
    }

    #[test]
    fn test_feed_overrides_and_imperial_units() {
        let set = model_set(vec![vec![p(0.0, 0.0), p(1.0, 1.0)]]);
        let params = PlannerParameters {
            draw_speed: 600.0,
            travel_speed: 2400.0,
            units: MeasurementSystem::Imperial,
            ..Default::default()
        };
        let text = plan(&set, &Placement::new(0.0, 0.0, 2.0, 2.0), &params)
            .unwrap()
            .render();
        assert!(text.starts_with("G20 ; Set units to in\n"));
        assert!(text.contains("G0 X0.00 Y2.00 F2400\n"));
        assert!(text.contains("G1 X2.00 Y0.00 F600\n"));
    }

    #[test]
    fn test_progress_reaches_completion() {
        let set = model_set(vec![
            vec![p(0.0, 0.0), p(5.0, 5.0)],
            vec![p(6.0, 0.0), p(9.0, 2.0)],
        ]);
        let mut seen = Vec::new();
        plan_with_progress(
            &set,
            &Placement::new(0.0, 0.0, 10.0, 10.0),
            &PlannerParameters::default(),
            |v| seen.push(v),
        )
        .unwrap();
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&1.0));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_invalid_feed_rate() {
        let params = PlannerParameters {
            draw_speed: 0.0,
            ..Default::default()
        };
        let err = plan(
            &PathSet::new(CoordinateSpace::Model),
            &Placement::new(0.0, 0.0, 1.0, 1.0),
            &params,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_transform_paths_is_machine_space() {
        let set = model_set(vec![vec![p(0.0, 0.0), p(10.0, 10.0)]]);
        let machine = transform_paths(&set, &Placement::new(5.0, 5.0, 20.0, 20.0)).unwrap();
        assert_eq!(machine.space(), CoordinateSpace::Machine);
        assert_eq!(machine.polylines()[0].points(), &[p(5.0, 25.0), p(25.0, 5.0)]);
    }
}
