// THEORY:
// The `SegmentClassifier` walks a `SimplifiedPolygon` as a closed loop and labels each
// edge between consecutive vertices.
//
// 1.  **Cyclic Pairs**: A polygon with V vertices has exactly V segments: every
//     (v[i], v[i + 1]) plus the wrap-around (v[V - 1], v[0]). Polygons with fewer than
//     2 vertices yield nothing.
// 2.  **Classification Order**: The vertical test (`dx == 0`) runs before the
//     horizontal test (`dy == 0`). A degenerate segment whose ends coincide is therefore
//     vertical, and later renders as a zero-length vertical line.

use crate::core_modules::contour_extractor::Point;
use crate::core_modules::polygon_simplifier::SimplifiedPolygon;

/// One edge of a simplified polygon, in image-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// Which equation shape a segment becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Vertical,
    Horizontal,
    General,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn dx(&self) -> i32 {
        self.end.x - self.start.x
    }

    pub fn dy(&self) -> i32 {
        self.end.y - self.start.y
    }

    pub fn kind(&self) -> SegmentKind {
        if self.dx() == 0 {
            SegmentKind::Vertical
        } else if self.dy() == 0 {
            SegmentKind::Horizontal
        } else {
            SegmentKind::General
        }
    }
}

pub fn classify(segment: &Segment) -> SegmentKind {
    segment.kind()
}

/// All V segments of a V-vertex polygon, wrap-around pair included.
pub fn segments(polygon: &SimplifiedPolygon) -> Vec<Segment> {
    let v = &polygon.vertices;
    if v.len() < 2 {
        return Vec::new();
    }
    (0..v.len())
        .map(|i| Segment::new(v[i], v[(i + 1) % v.len()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polygon(points: &[(i32, i32)]) -> SimplifiedPolygon {
        SimplifiedPolygon::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn segment_count_equals_vertex_count() {
        for n in 2..8 {
            let pts: Vec<(i32, i32)> = (0..n).map(|i| (i * 3, i * i)).collect();
            assert_eq!(segments(&polygon(&pts)).len(), n as usize);
        }
    }

    #[test]
    fn last_segment_wraps_to_first_vertex() {
        let segs = segments(&polygon(&[(0, 0), (10, 0), (10, 10)]));
        assert_eq!(segs[2], Segment::new(Point::new(10, 10), Point::new(0, 0)));
    }

    #[test]
    fn two_vertices_give_out_and_back() {
        let segs = segments(&polygon(&[(0, 0), (10, 10)]));
        assert_eq!(
            segs,
            vec![
                Segment::new(Point::new(0, 0), Point::new(10, 10)),
                Segment::new(Point::new(10, 10), Point::new(0, 0)),
            ]
        );
    }

    #[test]
    fn fewer_than_two_vertices_give_nothing() {
        assert!(segments(&polygon(&[])).is_empty());
        assert!(segments(&polygon(&[(1, 1)])).is_empty());
    }

    #[test]
    fn classification() {
        let p = |x, y| Point::new(x, y);
        assert_eq!(Segment::new(p(3, 0), p(3, 9)).kind(), SegmentKind::Vertical);
        assert_eq!(Segment::new(p(0, 4), p(9, 4)).kind(), SegmentKind::Horizontal);
        assert_eq!(Segment::new(p(0, 0), p(9, 4)).kind(), SegmentKind::General);
    }

    #[test]
    fn degenerate_segment_is_vertical() {
        let p = Point::new(5, 5);
        assert_eq!(classify(&Segment::new(p, p)), SegmentKind::Vertical);
    }
}
