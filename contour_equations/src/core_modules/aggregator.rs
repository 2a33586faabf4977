// THEORY:
// The `Aggregator` collects every `Equation` produced for one image into an explicit,
// ordered `EquationSheet` that the pipeline threads through its per-contour loop. It
// replaces any notion of a shared, global list of output lines.
//
// The sheet preserves visiting order (contour by contour, segment by segment) and
// renders to the final text blob: one line per equation joined by `\n`, or the single
// fallback line when nothing was found.

use crate::core_modules::equation::Equation;
use crate::core_modules::renderer::render;

/// The line emitted when an image yields no equations at all.
pub const NO_EQUATIONS_FALLBACK: &str =
    "# No contours/equations were detected. Try a clearer or higher-contrast image.";

/// Ordered builder of the equations for one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquationSheet {
    equations: Vec<Equation>,
}

impl EquationSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, equation: Equation) {
        self.equations.push(equation);
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    /// The final text blob, with no trailing newline.
    pub fn render(&self) -> String {
        if self.equations.is_empty() {
            return NO_EQUATIONS_FALLBACK.to_string();
        }
        self.equations.iter().map(render).collect::<Vec<_>>().join("\n")
    }
}

impl Extend<Equation> for EquationSheet {
    fn extend<I: IntoIterator<Item = Equation>>(&mut self, iter: I) {
        self.equations.extend(iter);
    }
}

impl FromIterator<Equation> for EquationSheet {
    fn from_iter<I: IntoIterator<Item = Equation>>(iter: I) -> Self {
        Self { equations: iter.into_iter().collect() }
    }
}
