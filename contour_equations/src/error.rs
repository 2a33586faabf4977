// THEORY:
// Every failure the engine can report to its caller is one of three kinds, and the
// caller always receives both the kind and a human-readable message:
//
// 1.  **Decode**: the bytes are not an image we can read. Nothing else runs.
// 2.  **Validation**: the tolerance (or another tunable) is unusable. Raised before
//     a single pixel is touched.
// 3.  **Processing**: something unexpected went wrong inside the edge, contour, or
//     simplification stages, including a worker that panicked or timed out.
//
// Per-contour oddities (a contour collapsing to a single vertex, for example) are
// never errors. Those are skipped inside the pipeline and processing continues.

use std::fmt;

/// The coarse category of a `PipelineError`, for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    Validation,
    Processing,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Decode => write!(f, "decode error"),
            ErrorKind::Validation => write!(f, "validation error"),
            ErrorKind::Processing => write!(f, "processing error"),
        }
    }
}

/// A structured failure surfaced by the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// The input bytes could not be interpreted as an image.
    #[error("Could not decode image: {message}")]
    Decode { message: String },
    /// A tolerance or configuration value was rejected before processing.
    #[error("{message}")]
    Validation { message: String },
    /// An unexpected failure inside one of the raster or geometry stages.
    #[error("Error processing image: {message}")]
    Processing { message: String },
}

impl PipelineError {
    pub fn decode(message: impl Into<String>) -> Self {
        PipelineError::Decode { message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PipelineError::Validation { message: message.into() }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        PipelineError::Processing { message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Decode { .. } => ErrorKind::Decode,
            PipelineError::Validation { .. } => ErrorKind::Validation,
            PipelineError::Processing { .. } => ErrorKind::Processing,
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            PipelineError::Decode { message }
            | PipelineError::Validation { message }
            | PipelineError::Processing { message } => message,
        }
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        PipelineError::decode(err.to_string())
    }
}
