// THEORY:
// The `pipeline` module is the top-level API for the engine. It wires the stages into
// a single synchronous pass over one image:
//
//   decode -> detect_edges -> extract_contours -> (simplify -> segments -> synthesize)
//   per contour -> EquationSheet -> text
//
// Key architectural principles:
// 1.  **Validate First**: The tolerance and every tunable are checked before a single
//     byte is decoded, so a `Validation` error always means no work was done.
// 2.  **Per-Invocation State**: Every raster, edge map, contour, and sheet is created
//     fresh for one call and owned by it. A pipeline value can be shared freely across
//     threads; it only holds configuration.
// 3.  **Local Recovery**: A contour that is too short or collapses under simplification
//     is counted and skipped. It never fails the image.
// 4.  **Explicit Accumulation**: Equations flow into an `EquationSheet` that is passed
//     down the per-contour loop, keeping visiting order intact.

use crate::core_modules::aggregator::EquationSheet;
use crate::core_modules::contour_extractor::{ChainApproximation, Contour, extract_contours};
use crate::core_modules::edge_detector::detect_edges;
use crate::core_modules::equation::Equation;
use crate::core_modules::polygon_simplifier::simplify;
use crate::core_modules::raster::decode;
use crate::core_modules::segment::segments;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, trace};

// Re-export key data structures for the public API.
pub use crate::core_modules::aggregator::NO_EQUATIONS_FALLBACK;
pub use crate::error::ErrorKind;

/// Inaccuracy used when the caller does not pick one.
pub const DEFAULT_TOLERANCE: f64 = 0.002;

/// Tolerances in this range give sensible output; others are accepted anyway.
pub const RECOMMENDED_TOLERANCE: std::ops::RangeInclusive<f64> = 0.001..=0.05;

/// Largest accepted Gaussian kernel size.
pub const MAX_BLUR_KERNEL_SIZE: u32 = 99;

const INVALID_TOLERANCE: &str = "Invalid inaccuracy value. Please enter a positive number.";

/// Configuration for the `EquationPipeline`, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fraction of each contour's perimeter used as the simplification distance.
    pub tolerance: f64,
    /// Odd width of the Gaussian smoothing kernel, in pixels.
    pub blur_kernel_size: u32,
    /// Gaussian sigma. `None` derives it from `blur_kernel_size`.
    pub blur_sigma: Option<f32>,
    /// Canny hysteresis low threshold.
    pub canny_low: f32,
    /// Canny hysteresis high threshold.
    pub canny_high: f32,
    pub chain_approximation: ChainApproximation,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            blur_kernel_size: 5,
            blur_sigma: None,
            canny_low: 100.0,
            canny_high: 200.0,
            chain_approximation: ChainApproximation::Simple,
        }
    }
}

impl PipelineConfig {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance, ..Self::default() }
    }

    /// Rejects values the stages cannot run with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        validate_tolerance(self.tolerance)?;
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return Err(PipelineError::validation(format!(
                "blur kernel size must be a positive odd number, got {}",
                self.blur_kernel_size
            )));
        }
        if self.blur_kernel_size > MAX_BLUR_KERNEL_SIZE {
            return Err(PipelineError::validation(format!(
                "blur kernel size must be at most {MAX_BLUR_KERNEL_SIZE}, got {}",
                self.blur_kernel_size
            )));
        }
        if let Some(sigma) = self.blur_sigma {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(PipelineError::validation(format!(
                    "blur sigma must be positive, got {sigma}"
                )));
            }
        }
        if !(self.canny_low.is_finite() && self.canny_high.is_finite())
            || self.canny_low < 0.0
            || self.canny_low > self.canny_high
        {
            return Err(PipelineError::validation(format!(
                "canny thresholds must satisfy 0 <= low <= high, got low={} high={}",
                self.canny_low, self.canny_high
            )));
        }
        Ok(())
    }
}

/// Checks that a tolerance is a finite number above zero.
pub fn validate_tolerance(tolerance: f64) -> Result<(), PipelineError> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(PipelineError::validation(INVALID_TOLERANCE))
    }
}

/// Parses a textual tolerance, rejecting anything non-numeric or not above zero.
pub fn parse_tolerance(input: &str) -> Result<f64, PipelineError> {
    let tolerance: f64 = input
        .trim()
        .parse()
        .map_err(|_| PipelineError::validation(INVALID_TOLERANCE))?;
    validate_tolerance(tolerance)?;
    Ok(tolerance)
}

/// Counters gathered while processing one image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    pub edge_pixels: usize,
    pub contours: usize,
    /// Contours dropped for having too few points or collapsing under simplification.
    pub skipped_contours: usize,
    pub polygons: usize,
    pub vertices: usize,
    pub elapsed_ms: u128,
}

/// The primary output of the pipeline for a single image.
#[derive(Debug, Clone, PartialEq)]
pub struct EquationReport {
    pub image_width: u32,
    pub image_height: u32,
    pub sheet: EquationSheet,
    pub stats: StageStats,
}

impl EquationReport {
    /// The wire text: one equation per line, or the fallback line.
    pub fn text(&self) -> String {
        self.sheet.render()
    }

    pub fn equations(&self) -> &[Equation] {
        self.sheet.equations()
    }
}

/// The main, top-level struct for the engine.
#[derive(Debug, Clone, Default)]
pub struct EquationPipeline {
    config: PipelineConfig,
}

impl EquationPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage over one encoded image.
    pub fn process(&self, image_bytes: &[u8]) -> Result<EquationReport, PipelineError> {
        let started = Instant::now();

        // Stage 0: Validation
        self.config.validate()?;

        // Stage 1: Decoding
        let raster = decode(image_bytes)?;
        let (image_width, image_height) = (raster.width(), raster.height());
        debug!(image_width, image_height, bytes = image_bytes.len(), "image decoded");

        // Stage 2: Edge Detection
        let edges = detect_edges(&raster, &self.config)?;

        // Stage 3: Contour Extraction
        let contours = extract_contours(&edges, self.config.chain_approximation);

        // Stage 4: Simplification & Synthesis
        let mut sheet = EquationSheet::new();
        let mut stats = StageStats {
            edge_pixels: edges.edge_pixel_count(),
            contours: contours.len(),
            ..StageStats::default()
        };
        for contour in &contours {
            match append_contour_equations(contour, self.config.tolerance, image_height, &mut sheet) {
                Some(vertices) => {
                    stats.polygons += 1;
                    stats.vertices += vertices;
                }
                None => {
                    trace!(points = contour.len(), "contour skipped");
                    stats.skipped_contours += 1;
                }
            }
        }
        stats.elapsed_ms = started.elapsed().as_millis();

        info!(
            image_width,
            image_height,
            contours = stats.contours,
            skipped = stats.skipped_contours,
            equations = sheet.len(),
            elapsed_ms = stats.elapsed_ms as u64,
            "image vectorized"
        );

        Ok(EquationReport { image_width, image_height, sheet, stats })
    }
}

/// Simplifies one contour and appends one equation per polygon segment.
///
/// Returns the polygon's vertex count, or `None` when the contour was skipped.
pub fn append_contour_equations(
    contour: &Contour,
    tolerance: f64,
    image_height: u32,
    sheet: &mut EquationSheet,
) -> Option<usize> {
    let polygon = simplify(contour, tolerance)?;
    sheet.extend(
        segments(&polygon)
            .iter()
            .map(|segment| Equation::synthesize(segment, image_height)),
    );
    Some(polygon.len())
}

/// Convenience entry point: encoded image and tolerance in, wire text out.
pub fn image_to_equations(image_bytes: &[u8], tolerance: f64) -> Result<String, PipelineError> {
    validate_tolerance(tolerance)?;
    let report = EquationPipeline::new(PipelineConfig::with_tolerance(tolerance)).process(image_bytes)?;
    Ok(report.text())
}
