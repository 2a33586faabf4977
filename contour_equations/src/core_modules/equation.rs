// THEORY:
// The `EquationSynthesizer` is where image geometry becomes plotting geometry. Each
// `Segment` becomes exactly one `Equation`, and this is the only place in the engine
// where the image-to-Cartesian flip `cart_y = image_height - image_y` is applied.
//
// Key architectural principles:
// 1.  **Geometry, Not Text**: An `Equation` holds numbers only. Turning it into the
//     graphing tool's syntax is the `renderer`'s job, so the math here can be checked
//     with plain numeric assertions.
// 2.  **Axis-Aligned Lines Stay Exact**: Vertical and horizontal segments become
//     restricted lines with integer bounds, lower bound first.
// 3.  **Synthetic Cubic**: Every other segment becomes a cubic Bezier whose inner
//     control points sit at 1/3 and 2/3 of the way along the segment. The curve traces
//     the straight segment exactly; it is a smoothing heuristic and makes no attempt to
//     recover curvature that simplification already discarded.

use crate::core_modules::contour_extractor::Point;
use crate::core_modules::segment::{Segment, SegmentKind, classify};

/// Converts an image row to a Cartesian y for an image of the given height.
pub fn cartesian_y(image_height: u32, image_y: f64) -> f64 {
    image_height as f64 - image_y
}

/// One axis of a cubic Bezier: its four control values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierAxis {
    pub start: f64,
    pub control1: f64,
    pub control2: f64,
    pub end: f64,
}

impl BezierAxis {
    /// Bernstein blend at parameter `t` in `[0, 1]`.
    pub fn eval(&self, t: f64) -> f64 {
        let u = 1.0 - t;
        u * u * u * self.start
            + 3.0 * u * u * t * self.control1
            + 3.0 * u * t * t * self.control2
            + t * t * t * self.end
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            start: f(self.start),
            control1: f(self.control1),
            control2: f(self.control2),
            end: f(self.end),
        }
    }
}

/// A single plotted expression, in Cartesian space (y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Equation {
    /// `x = x` restricted to `y0 <= y <= y1`.
    VerticalLine { x: i64, y0: i64, y1: i64 },
    /// `y = y` restricted to `x0 <= x <= x1`.
    HorizontalLine { y: i64, x0: i64, x1: i64 },
    /// `(x(t), y(t))` for `t` in `[0, 1]`.
    ParametricCurve { x: BezierAxis, y: BezierAxis },
}

impl Equation {
    /// Builds the equation for one image-space segment.
    pub fn synthesize(segment: &Segment, image_height: u32) -> Self {
        let Segment { start: p1, end: p2 } = *segment;
        let flip = |y: i32| image_height as i64 - y as i64;

        match classify(segment) {
            SegmentKind::Vertical => {
                let (a, b) = (flip(p1.y), flip(p2.y));
                Equation::VerticalLine { x: p1.x as i64, y0: a.min(b), y1: a.max(b) }
            }
            SegmentKind::Horizontal => Equation::HorizontalLine {
                y: flip(p1.y),
                x0: p1.x.min(p2.x) as i64,
                x1: p1.x.max(p2.x) as i64,
            },
            SegmentKind::General => {
                let (x, y) = control_polygon(p1, p2);
                Equation::ParametricCurve {
                    x,
                    y: y.map(|v| cartesian_y(image_height, v)),
                }
            }
        }
    }

    /// Evaluates the curve at `t`; `None` for the restricted lines.
    #[cfg(test)]
    pub fn point_at(&self, t: f64) -> Option<(f64, f64)> {
        match self {
            Equation::ParametricCurve { x, y } => Some((x.eval(t), y.eval(t))),
            _ => None,
        }
    }
}

/// Image-space control values for a straight segment, per axis.
///
/// `c1 = (2·p1 + p2) / 3` and `c2 = (p1 + 2·p2) / 3`.
pub fn control_polygon(p1: Point, p2: Point) -> (BezierAxis, BezierAxis) {
    let axis = |a: i32, b: i32| {
        let (a, b) = (a as f64, b as f64);
        BezierAxis {
            start: a,
            control1: (2.0 * a + b) / 3.0,
            control2: (a + 2.0 * b) / 3.0,
            end: b,
        }
    };
    (axis(p1.x, p2.x), axis(p1.y, p2.y))
}
