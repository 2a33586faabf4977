// THEORY:
// The `renderer` is the wire contract with the graphing tool. It turns an `Equation`
// into exactly one line of text, and nothing else in the engine knows this syntax.
//
// Line shapes:
//   x = {x} \left\{{y0} <= y <= {y1}\right\}
//   y = {y} \left\{{x0} <= x <= {x1}\right\}
//   (((1-t)^3*A + 3*(1-t)^2*t*B + 3*(1-t)*t^2*C + t^3*D), (1-t)^3*E + ... + t^3*H)
//
// The x expression of a curve carries its own parentheses and the y expression does
// not; consumers already parse that exact shape. The parameter range `t` in [0, 1] is
// the consumer's default and is never written out.

use crate::core_modules::equation::{BezierAxis, Equation};
use std::fmt;

/// Writes a number the way the graphing tool expects: integral values without a
/// fractional part, everything else with the shortest round-trip representation.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// The cubic Bernstein blend for one axis, without surrounding parentheses.
pub fn bezier_expression(axis: &BezierAxis) -> String {
    format!(
        "(1-t)^3*{} + 3*(1-t)^2*t*{} + 3*(1-t)*t^2*{} + t^3*{}",
        format_number(axis.start),
        format_number(axis.control1),
        format_number(axis.control2),
        format_number(axis.end),
    )
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Equation::VerticalLine { x, y0, y1 } => {
                write!(f, "x = {x} \\left\\{{{y0} <= y <= {y1}\\right\\}}")
            }
            Equation::HorizontalLine { y, x0, x1 } => {
                write!(f, "y = {y} \\left\\{{{x0} <= x <= {x1}\\right\\}}")
            }
            Equation::ParametricCurve { x, y } => {
                write!(f, "(({}), {})", bezier_expression(x), bezier_expression(y))
            }
        }
    }
}

/// Renders one equation as a single output line.
pub fn render(equation: &Equation) -> String {
    equation.to_string()
}
