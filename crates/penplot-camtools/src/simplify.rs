//! Polyline simplification
//!
//! Douglas-Peucker reduction for open and closed point sequences, plus the
//! detection of out-and-back rings produced when a border follower walks both
//! sides of a thin stroke.

use penplot_core::{Point, POINT_EPSILON};
use std::collections::HashSet;

/// Distance from `p` to the segment `a`-`b`
pub fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Douglas-Peucker simplification of an open polyline
///
/// The first and last points are always kept. A vertex survives when it lies
/// farther than `tolerance` from the chord of its span.
pub fn douglas_peucker(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let (a, b) = (points[first], points[last]);
        let mut max_dist = 0.0;
        let mut index = first;
        for (i, &p) in points.iter().enumerate().take(last).skip(first + 1) {
            let d = segment_distance(p, a, b);
            if d > max_dist {
                max_dist = d;
                index = i;
            }
        }
        if max_dist > tolerance {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

/// Simplify a closed loop given as its ring of vertices (no repeated end)
///
/// The ring is split at the vertex farthest from its first point so both
/// anchors survive, each half is simplified, and the result is closed by
/// repeating the first point.
pub fn simplify_closed(ring: &[Point], tolerance: f64) -> Vec<Point> {
    match ring.len() {
        0 => return Vec::new(),
        1 => return vec![ring[0], ring[0]],
        _ => {}
    }

    let start = ring[0];
    let split = ring
        .iter()
        .enumerate()
        .fold((0, 0.0), |(best, best_d), (i, &p)| {
            let d = p.distance_squared(start);
            if d > best_d {
                (i, d)
            } else {
                (best, best_d)
            }
        })
        .0;

    if split == 0 {
        // Every vertex coincides with the start
        return vec![start, start];
    }

    let mut second: Vec<Point> = ring[split..].to_vec();
    second.push(start);

    let mut out = douglas_peucker(&ring[..=split], tolerance);
    out.pop();
    out.extend(douglas_peucker(&second, tolerance));
    out
}

/// Drop consecutive duplicate points
pub fn dedup_consecutive(points: &mut Vec<Point>) {
    points.dedup_by(|b, a| a.approx_eq(*b, POINT_EPSILON));
}

/// Share of a trace that must run next to the other trace to count as a retrace
const RETRACE_MATCH_RATIO: f64 = 0.9;

type Pixel = (i64, i64);

fn pixel(p: Point) -> Pixel {
    (p.x.round() as i64, p.y.round() as i64)
}

fn neighborhood(px: Pixel) -> impl Iterator<Item = Pixel> {
    (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| (px.0 + dx, px.1 + dy)))
}

/// Stroke end reached from `from`: the farthest pixel in 8-connected hops
///
/// Among equally distant pixels the one with the fewest neighbors wins, so a
/// staircase corner pixel next to the tip is not mistaken for the tip.
fn stroke_end(pixels: &HashSet<Pixel>, from: Pixel) -> Pixel {
    let mut seen = HashSet::from([from]);
    let mut layer = vec![from];
    loop {
        let mut next = Vec::new();
        for &px in &layer {
            for n in neighborhood(px) {
                if pixels.contains(&n) && seen.insert(n) {
                    next.push(n);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        layer = next;
    }

    let degree = |px: Pixel| {
        neighborhood(px)
            .filter(|n| *n != px && pixels.contains(n))
            .count()
    };
    layer
        .iter()
        .copied()
        .min_by_key(|&px| degree(px))
        .unwrap_or(from)
}

fn coverage(points: &[Point], along: &HashSet<Pixel>) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let hits = points
        .iter()
        .filter(|&&p| neighborhood(pixel(p)).any(|n| along.contains(&n)))
        .count();
    hits as f64 / points.len() as f64
}

/// Whether `points` runs within one pixel of `along` nearly everywhere
pub fn traces_along(points: &[Point], along: &[Point]) -> bool {
    let along: HashSet<Pixel> = along.iter().map(|&p| pixel(p)).collect();
    coverage(points, &along) >= RETRACE_MATCH_RATIO
}

/// Open half of a pixel border ring that walks out along a stroke and back
///
/// `ring` is an 8-connected border trace without a repeated end point. The
/// stroke ends are the two pixels farthest apart in hops; the ring is cut at
/// them and accepted as a retrace when each half runs along the other. Both
/// sides of a staircase may differ by a corner pixel, so the halves are
/// matched within one pixel rather than point for point.
///
/// The returned half starts at whichever end the ring reaches first.
pub fn open_retraced(ring: &[Point]) -> Option<Vec<Point>> {
    if ring.len() < 2 {
        return None;
    }

    let pixels: HashSet<Pixel> = ring.iter().map(|&p| pixel(p)).collect();
    let u = stroke_end(&pixels, pixel(ring[0]));
    let v = stroke_end(&pixels, u);
    if u == v {
        return None;
    }

    let iu = ring.iter().position(|&p| pixel(p) == u)?;
    let iv = ring.iter().position(|&p| pixel(p) == v)?;
    let (first, last) = (iu.min(iv), iu.max(iv));

    let outbound = &ring[first..=last];
    let back: Vec<Point> = ring[last..]
        .iter()
        .chain(&ring[..=first])
        .copied()
        .collect();

    if traces_along(outbound, &back) && traces_along(&back, outbound) {
        Some(outbound.to_vec())
    } else {
        None
    }
}
