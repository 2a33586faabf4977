// THEORY:
// The `raster` module holds the two grid-shaped data containers of the engine and the
// decoder that produces the first of them.
//
// Key architectural principles:
// 1.  **Image-Space Only**: Both grids use the image convention: origin at the top-left
//     corner, x to the right, y downward. No Cartesian flipping ever happens here; that
//     is deferred to equation construction.
// 2.  **Dumb Containers**: `RasterImage` is a flattened, row-major `Vec<Pixel>` plus its
//     dimensions, in the same spirit as a `Chunk`. `EdgeMap` wraps a gray raster where
//     255 marks an edge pixel and 0 marks background.
// 3.  **Decoding is a Boundary**: `decode` is the single place where untrusted bytes are
//     interpreted. Anything it cannot read becomes a `Decode` error and the pipeline
//     does not run.

use crate::core_modules::pixel::pixel::Pixel;
use crate::error::PipelineError;
use image::{GrayImage, Luma};

/// Value stored in an `EdgeMap` for an edge pixel.
pub const EDGE: u8 = 255;

/// A decoded RGB image in image-space (origin top-left, y down).
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    /// Row-major pixels, `width * height` of them.
    pixels: Vec<Pixel>,
}

impl RasterImage {
    /// Builds a raster from interleaved 8-bit RGB samples.
    pub fn from_rgb_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, PipelineError> {
        let expected = width as usize * height as usize * 3;
        if bytes.len() != expected {
            return Err(PipelineError::processing(format!(
                "unsupported channel layout: expected {expected} RGB bytes for {width}x{height}, got {}",
                bytes.len()
            )));
        }
        let pixels = bytes
            .chunks_exact(3)
            .map(Pixel::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|len| PipelineError::processing(format!("malformed pixel of {len} bytes")))?;
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixel at `(x, y)`, or `None` outside the image.
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Collapses the raster to a single intensity channel.
    pub fn to_gray(&self) -> Result<GrayImage, PipelineError> {
        let samples: Vec<u8> = self.pixels.iter().map(Pixel::gray).collect();
        let len = samples.len();
        GrayImage::from_raw(self.width, self.height, samples).ok_or_else(|| {
            PipelineError::processing(format!(
                "gray buffer of {len} samples does not fit {}x{}",
                self.width, self.height
            ))
        })
    }
}

/// Decodes PNG/JPEG (or any format the `image` crate is built with) into a raster.
pub fn decode(bytes: &[u8]) -> Result<RasterImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::decode("input image data is empty"));
    }
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::decode(format!("image has no pixels ({width}x{height})")));
    }
    RasterImage::from_rgb_bytes(width, height, rgb.as_raw())
}

/// Binary edge grid with the same dimensions as the raster it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap(GrayImage);

impl EdgeMap {
    /// Wraps a gray raster, treating every non-zero sample as an edge.
    pub fn from_gray(gray: GrayImage) -> Self {
        let mut binary = gray;
        for Luma([value]) in binary.pixels_mut() {
            *value = if *value > 0 { EDGE } else { 0 };
        }
        EdgeMap(binary)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    #[cfg(test)]
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.0.get_pixel(x, y).0[0] == EDGE
    }

    pub fn edge_pixel_count(&self) -> usize {
        self.0.pixels().filter(|p| p.0[0] == EDGE).count()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }
}
