// THEORY:
// This file is the main entry point for the `contour_equations` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (the CLI, or any service that wants
// to hand us image bytes and a tolerance and get equation text back).
//
// The primary goal is to export the `EquationPipeline` and its associated data
// structures (`PipelineConfig`, `EquationReport`, `PipelineError`) as the clean,
// high-level interface, with `ParallelPipeline` for callers that vectorize many
// images at once. The individual stages live in `core_modules` and stay public so
// each can be exercised on its own.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use error::{ErrorKind, PipelineError};
pub use pipeline::{
    EquationPipeline, EquationReport, PipelineConfig, image_to_equations, parse_tolerance,
};
