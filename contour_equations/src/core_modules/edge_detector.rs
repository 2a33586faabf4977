// THEORY:
// The `EdgeDetector` turns a decoded `RasterImage` into a binary `EdgeMap`. It is the
// first geometric stage of the engine and the only one that looks at intensities.
//
// Algorithm steps:
// 1.  **Grayscale**: collapse RGB into Rec. 601 luma, one byte per pixel.
// 2.  **Smoothing**: a separable Gaussian of fixed odd size (5 by default). With no
//     explicit sigma, small kernels (1, 3, 5, 7 taps) use the exact binomial weights
//     that imaging toolkits use for "sigma = 0"; larger ones derive sigma from the
//     kernel size with `0.3 * ((ksize - 1) / 2 - 1) + 0.8`.
// 3.  **Canny**: dual-threshold hysteresis (low 100, high 200 by default) marks the
//     final edge pixels.
//
// The thresholds and kernel size come from `PipelineConfig` rather than literals so
// they can be tuned and tested; callers of the top-level API never see them.

use crate::core_modules::raster::{EdgeMap, RasterImage};
use crate::error::PipelineError;
use crate::pipeline::PipelineConfig;
use image::GrayImage;
use tracing::debug;

/// Fixed binomial weights used for small kernels when no sigma is given.
const SMALL_KERNELS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

/// Sigma implied by a kernel size when the caller does not pin one.
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Builds the normalized 1D Gaussian used for both smoothing passes.
pub fn gaussian_kernel(kernel_size: u32, sigma: Option<f32>) -> Vec<f32> {
    let size = kernel_size.max(1) as usize;
    if sigma.is_none() && size % 2 == 1 && size <= 7 {
        return SMALL_KERNELS[size / 2].to_vec();
    }

    let sigma = sigma.filter(|s| *s > 0.0).unwrap_or_else(|| sigma_for_kernel(kernel_size));
    let center = (size as f32 - 1.0) * 0.5;
    let scale = -0.5 / (sigma * sigma);
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let offset = i as f32 - center;
            (scale * offset * offset).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Smooths a gray raster with the configured separable Gaussian.
pub fn smooth(gray: &GrayImage, config: &PipelineConfig) -> GrayImage {
    let kernel = gaussian_kernel(config.blur_kernel_size, config.blur_sigma);
    if kernel.len() == 1 {
        return gray.clone();
    }
    imageproc::filter::separable_filter_equal(gray, &kernel)
}

/// Runs grayscale conversion, smoothing, and Canny on a raster.
///
/// The configuration is expected to be validated already: Canny asserts that the
/// high threshold is not below the low one.
pub fn detect_edges(raster: &RasterImage, config: &PipelineConfig) -> Result<EdgeMap, PipelineError> {
    let gray = raster.to_gray()?;
    let smoothed = smooth(&gray, config);
    let edges = imageproc::edges::canny(&smoothed, config.canny_low, config.canny_high);
    let edge_map = EdgeMap::from_gray(edges);
    debug!(
        width = edge_map.width(),
        height = edge_map.height(),
        edge_pixels = edge_map.edge_pixel_count(),
        "edge map ready"
    );
    Ok(edge_map)
}
