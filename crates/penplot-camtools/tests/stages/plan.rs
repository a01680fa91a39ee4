use penplot_camtools::{plan, ErrorKind, MotionCommand, PlannerParameters};
use penplot_core::{CoordinateSpace, PathSet, Placement, Point, Polyline};

fn set(lines: Vec<Vec<(f64, f64)>>) -> PathSet {
    PathSet::from_polylines(
        CoordinateSpace::Model,
        lines
            .into_iter()
            .map(|pts| Polyline::model(pts.into_iter().map(Point::from).collect()))
            .collect(),
    )
}

fn travel_targets(paths: &PathSet, placement: &Placement) -> Vec<Point> {
    plan(paths, placement, &PlannerParameters::default())
        .unwrap()
        .commands()
        .iter()
        .filter_map(|c| match c {
            MotionCommand::Travel { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

#[test]
fn test_empty_set_has_only_fixed_commands() {
    let program = plan(
        &PathSet::new(CoordinateSpace::Model),
        &Placement::new(10.0, 10.0, 50.0, 50.0),
        &PlannerParameters::default(),
    )
    .unwrap();

    assert_eq!(program.draw_count(), 0);
    assert_eq!(program.travel_count(), 0);
    assert_eq!(
        program.commands().first(),
        Some(&MotionCommand::Units(Default::default()))
    );
    assert_eq!(program.commands().last(), Some(&MotionCommand::Home));
}

#[test]
fn test_short_paths_are_filtered_inclusively() {
    let paths = set(vec![
        vec![(0.0, 0.0), (0.2, 0.0)],
        vec![(0.0, 5.0), (0.3, 5.0)],
        vec![(10.0, 10.0), (10.4, 10.0)],
    ]);
    let program = plan(
        &paths,
        &Placement::new(0.0, 0.0, 100.0, 100.0),
        &PlannerParameters::default(),
    )
    .unwrap();
    // 0.3 and 0.4 survive, 0.2 does not
    assert_eq!(program.statistics().path_count, 2);
}

#[test]
fn test_nearest_neighbor_visits_closest_start_first() {
    let paths = set(vec![
        vec![(0.0, 0.0), (1.0, 1.0)],
        vec![(10.0, 10.0), (11.0, 11.0)],
        vec![(2.0, 2.0), (3.0, 3.0)],
    ]);
    // Identity-like placement: bbox (0,0)-(11,11) onto an 11 x 11 box
    let placement = Placement::new(0.0, 0.0, 11.0, 11.0);
    let starts = travel_targets(&paths, &placement);

    // Machine Y is the model Y mirrored within the box
    assert_eq!(
        starts,
        vec![
            Point::new(0.0, 11.0),
            Point::new(2.0, 9.0),
            Point::new(10.0, 1.0)
        ]
    );
}

#[test]
fn test_all_identical_points_is_degenerate() {
    let params = PlannerParameters {
        min_path_length: 0.0,
        ..Default::default()
    };
    let paths = set(vec![vec![(7.0, 7.0), (7.0, 7.0)], vec![(7.0, 7.0), (7.0, 7.0)]]);
    let err = plan(&paths, &Placement::new(0.0, 0.0, 10.0, 10.0), &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DegenerateGeometry);
}

#[test]
fn test_placement_corners_with_single_y_inversion() {
    let paths = set(vec![vec![(0.0, 0.0), (10.0, 10.0)]]);
    let text = plan(
        &paths,
        &Placement::new(5.0, 5.0, 20.0, 20.0),
        &PlannerParameters::default(),
    )
    .unwrap()
    .render();
    assert!(text.contains("G0 X5.00 Y25.00 F3000\n"));
    assert!(text.contains("G1 X25.00 Y5.00 F1200\n"));
}
