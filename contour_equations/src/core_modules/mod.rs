pub mod aggregator;
pub mod contour_extractor;
pub mod edge_detector;
pub mod equation;
pub mod pixel;
pub mod polygon_simplifier;
pub mod raster;
pub mod renderer;
pub mod segment;
