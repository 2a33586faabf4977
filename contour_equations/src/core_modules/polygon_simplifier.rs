// THEORY:
// The `PolygonSimplifier` reduces a traced `Contour` to a sparse `SimplifiedPolygon`
// using a closed-curve variant of Ramer-Douglas-Peucker.
//
// Key architectural principles:
// 1.  **Relative Tolerance**: The caller's inaccuracy value `k` is a fraction of the
//     contour's closed perimeter: `epsilon = k * perimeter`. Bigger shapes tolerate
//     proportionally bigger deviations.
// 2.  **Closed Treatment**: A closed loop has no natural end points. We anchor at the
//     first point and split at the point farthest from it. If even that point is within
//     epsilon, the whole loop collapses to the anchor. Otherwise both halves (anchor to
//     split, split back around to anchor) are simplified as ordinary open polylines.
// 3.  **Monotonicity**: The anchor and the split never depend on epsilon, and the
//     recursive step always splits a span at the same farthest point. A larger epsilon
//     therefore prunes a subtree of the recursion performed at a smaller epsilon, and
//     the kept vertex set can only shrink as `k` grows.
// 4.  **Order Preservation**: Kept vertices are a subset of the contour's points in
//     their original order. Nothing is reordered or deduplicated.
// 5.  **Local Recovery**: Contours with fewer than 2 points, and results with fewer
//     than 2 vertices, produce `None`. The caller simply moves on to the next contour.

use crate::core_modules::contour_extractor::{Contour, Point};
use tracing::trace;

/// The simplified, implicitly closed vertex loop of one contour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifiedPolygon {
    pub vertices: Vec<Point>,
}

impl SimplifiedPolygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Simplifies a closed contour with tolerance `k * perimeter(contour)`.
///
/// Returns `None` when the contour has fewer than 2 points or simplifies to fewer
/// than 2 vertices.
pub fn simplify(contour: &Contour, k: f64) -> Option<SimplifiedPolygon> {
    if contour.len() < 2 {
        trace!(points = contour.len(), "contour too short, skipped");
        return None;
    }

    let epsilon = k * contour.perimeter();
    let kept = simplify_closed(&contour.points, epsilon);
    if kept.len() < 2 {
        trace!(points = contour.len(), epsilon, "contour collapsed, skipped");
        return None;
    }
    Some(SimplifiedPolygon::new(kept))
}

/// Closed-loop Ramer-Douglas-Peucker over raw points.
pub fn simplify_closed(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }

    // --- 1. Anchor and split ---
    let anchor = points[0];
    let mut split = 0;
    let mut max_dist = 0.0;
    for (i, p) in points.iter().enumerate().skip(1) {
        let d = anchor.distance(*p);
        if d > max_dist {
            max_dist = d;
            split = i;
        }
    }
    if max_dist <= epsilon {
        return vec![anchor];
    }

    // --- 2. Simplify both halves as open polylines ---
    // The second half runs split..n and wraps back onto the anchor at index n.
    let mut kept = vec![false; n + 1];
    kept[0] = true;
    kept[split] = true;
    let at = |i: usize| points[i % n];
    rdp_recurse(&at, 0, split, epsilon, &mut kept);
    rdp_recurse(&at, split, n, epsilon, &mut kept);

    (0..n).filter(|&i| kept[i]).map(|i| points[i]).collect()
}

/// Recursive step: keep the farthest point of `start..end` if it lies beyond `epsilon`.
fn rdp_recurse<F>(at: &F, start: usize, end: usize, epsilon: f64, kept: &mut [bool])
where
    F: Fn(usize) -> Point,
{
    if end <= start + 1 {
        return;
    }

    let (a, b) = (at(start), at(end));
    let mut max_dist = 0.0;
    let mut max_idx = start;
    for i in (start + 1)..end {
        let d = perpendicular_distance(at(i), a, b);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        kept[max_idx] = true;
        rdp_recurse(at, start, max_idx, epsilon, kept);
        rdp_recurse(at, max_idx, end, epsilon, kept);
    }
}

/// Distance from `p` to the line through `a` and `b` (or to `a` when they coincide).
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let length = dx.hypot(dy);
    if length == 0.0 {
        return p.distance(a);
    }
    let cross = dx * (a.y - p.y) as f64 - dy * (a.x - p.x) as f64;
    cross.abs() / length
}
