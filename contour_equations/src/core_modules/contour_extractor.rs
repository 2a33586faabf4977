// THEORY:
// The `ContourExtractor` walks the `EdgeMap` and returns every boundary loop it can
// find as an ordered sequence of integer points.
//
// Key architectural principles:
// 1.  **Flat Listing**: Border following naturally discovers a containment hierarchy
//     (outer borders and the holes inside them). We throw that hierarchy away and
//     return all loops at the same level. Callers must not rely on the order of the
//     returned list, only on every loop being present.
// 2.  **Image-Space Points**: Points are pixel coordinates with the origin at the
//     top-left corner. They are never flipped here.
// 3.  **Chain Compression**: In `Simple` mode, points sitting in the middle of a
//     straight horizontal, vertical, or diagonal run are dropped, keeping only the run
//     end points. This shrinks the contour without changing its closed perimeter, so
//     the simplification tolerance derived from it is unaffected.
// 4.  **No Filtering**: Degenerate contours (0 or 1 points) are returned as-is. The
//     `PolygonSimplifier` owns the decision to skip them.

use crate::core_modules::raster::EdgeMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An integer pixel coordinate in image-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx.hypot(dy)
    }
}

/// An ordered, implicitly closed loop of image-space points.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Length of the closed loop, including the step from the last point back to the first.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| self.points[i].distance(self.points[(i + 1) % n]))
            .sum()
    }
}

/// How much of each traced border is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainApproximation {
    /// Every border pixel.
    None,
    /// Only the end points of straight runs.
    #[default]
    Simple,
}

/// Traces all boundary loops in the edge map, flattened into a single list.
pub fn extract_contours(edges: &EdgeMap, approximation: ChainApproximation) -> Vec<Contour> {
    let traced: Vec<imageproc::contours::Contour<i32>> =
        imageproc::contours::find_contours(edges.as_gray());

    let contours: Vec<Contour> = traced
        .into_iter()
        .map(|c| {
            let points = c.points.into_iter().map(|p| Point::new(p.x, p.y)).collect();
            match approximation {
                ChainApproximation::None => Contour::new(points),
                ChainApproximation::Simple => Contour::new(compress_runs(points)),
            }
        })
        .collect();

    debug!(
        contours = contours.len(),
        points = contours.iter().map(Contour::len).sum::<usize>(),
        ?approximation,
        "contours traced"
    );
    contours
}

/// Drops points whose incoming and outgoing steps point the same way.
/// The first point is always kept so the loop keeps its starting anchor.
pub fn compress_runs(points: Vec<Point>) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points;
    }
    let step = |a: Point, b: Point| ((b.x - a.x).signum(), (b.y - a.y).signum());

    (0..n)
        .filter(|&i| {
            if i == 0 {
                return true;
            }
            let prev = points[i - 1];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect()
}
