use penplot_camtools::{NearestNeighbor, NearestNeighborTwoOpt, PathOrderer};
use penplot_core::{Point, Polyline};
use proptest::prelude::*;

fn travel(paths: &[Polyline], order: &[usize]) -> f64 {
    let mut pen = Point::ORIGIN;
    let mut total = 0.0;
    for &i in order {
        total += pen.distance(paths[i].start().unwrap());
        pen = paths[i].end().unwrap();
    }
    total
}

fn segments() -> impl Strategy<Value = Vec<Polyline>> {
    prop::collection::vec(
        (0.0f64..100.0, 0.0f64..100.0, 0.0f64..100.0, 0.0f64..100.0),
        0..24,
    )
    .prop_map(|coords| {
        coords
            .into_iter()
            .map(|(a, b, c, d)| Polyline::model(vec![Point::new(a, b), Point::new(c, d)]))
            .collect()
    })
}

fn is_permutation(order: &[usize], n: usize) -> bool {
    let mut sorted = order.to_vec();
    sorted.sort_unstable();
    sorted == (0..n).collect::<Vec<_>>()
}

proptest! {
    #[test]
    fn orderers_return_permutations(paths in segments()) {
        let n = paths.len();
        prop_assert!(is_permutation(&NearestNeighbor.order(&paths, Point::ORIGIN), n));
        prop_assert!(is_permutation(&NearestNeighborTwoOpt.order(&paths, Point::ORIGIN), n));
    }

    #[test]
    fn two_opt_never_lengthens_travel(paths in segments()) {
        let greedy = NearestNeighbor.order(&paths, Point::ORIGIN);
        let refined = NearestNeighborTwoOpt.order(&paths, Point::ORIGIN);
        prop_assert!(travel(&paths, &refined) <= travel(&paths, &greedy) + 1e-6);
    }
}
