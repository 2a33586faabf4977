use contour_equations::core_modules::aggregator::EquationSheet;
use contour_equations::core_modules::contour_extractor::{ChainApproximation, Contour, Point};
use contour_equations::core_modules::equation::Equation;
use contour_equations::core_modules::polygon_simplifier::{SimplifiedPolygon, simplify};
use contour_equations::core_modules::segment::{Segment, segments};
use contour_equations::pipeline::{NO_EQUATIONS_FALLBACK, append_contour_equations};
use contour_equations::{EquationPipeline, ErrorKind, PipelineConfig, image_to_equations};
use image::{ImageEncoder, Rgb, RgbImage};

fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgb8)
        .expect("Error encoding PNG.");
    out
}

fn encode_jpeg(img: &RgbImage) -> Vec<u8> {
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 95)
        .write_image(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgb8)
        .expect("Error encoding JPEG.");
    out
}

fn shapes() -> RgbImage {
    let mut img = RgbImage::from_pixel(96, 72, Rgb([255, 255, 255]));
    // A dark rectangle and a dark triangle.
    for y in 10..40 {
        for x in 8..40 {
            img.put_pixel(x, y, Rgb([20, 20, 20]));
        }
    }
    for y in 20..64 {
        let half = (y - 20) / 2;
        for x in (70 - half)..=(70 + half) {
            img.put_pixel(x, y, Rgb([0, 0, 90]));
        }
    }
    img
}

#[test]
fn uniform_images_give_exactly_the_fallback_line() {
    for shade in [0u8, 127, 255] {
        let img = RgbImage::from_pixel(30, 20, Rgb([shade, shade, shade]));
        let text = image_to_equations(&encode_png(&img), 0.002).expect("runs");
        assert_eq!(text, NO_EQUATIONS_FALLBACK);
    }
}

#[test]
fn shapes_produce_well_formed_lines() {
    let text = image_to_equations(&encode_png(&shapes()), 0.005).expect("runs");
    assert_ne!(text, NO_EQUATIONS_FALLBACK);
    assert!(!text.ends_with('\n'));
    for line in text.lines() {
        let well_formed = (line.starts_with("x = ") && line.contains(" <= y <= ") && line.ends_with(r"\right\}"))
            || (line.starts_with("y = ") && line.contains(" <= x <= ") && line.ends_with(r"\right\}"))
            || (line.starts_with("(((1-t)^3*") && line.ends_with(')') && line.contains("), (1-t)^3*"));
        assert!(well_formed, "unexpected line: {line}");
    }
}

#[test]
fn jpeg_input_is_accepted() {
    let report = EquationPipeline::new(PipelineConfig::with_tolerance(0.005))
        .process(&encode_jpeg(&shapes()))
        .expect("jpeg decodes");
    assert_eq!((report.image_width, report.image_height), (96, 72));
    assert!(!report.sheet.is_empty());
}

#[test]
fn larger_tolerance_never_adds_equations() {
    let bytes = encode_png(&shapes());
    let mut previous = usize::MAX;
    for k in [0.001, 0.002, 0.005, 0.01, 0.05] {
        let report = EquationPipeline::new(PipelineConfig::with_tolerance(k))
            .process(&bytes)
            .expect("runs");
        assert!(report.sheet.len() <= previous, "k={k} grew the output");
        previous = report.sheet.len();
    }
}

#[test]
fn chain_modes_see_the_same_contours() {
    let bytes = encode_png(&shapes());
    let run = |chain| {
        let config = PipelineConfig { tolerance: 0.01, chain_approximation: chain, ..PipelineConfig::default() };
        EquationPipeline::new(config).process(&bytes).expect("runs")
    };
    let simple = run(ChainApproximation::Simple);
    let full = run(ChainApproximation::None);
    assert_eq!(simple.stats.contours, full.stats.contours);
    assert_eq!(simple.stats.edge_pixels, full.stats.edge_pixels);
}

#[test]
fn errors_carry_kind_and_message() {
    let err = image_to_equations(&[], 0.01).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(!err.message().is_empty());

    let err = image_to_equations(&encode_png(&shapes()), 0.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn config_round_trips_through_json() {
    let config = PipelineConfig {
        tolerance: 0.01,
        blur_sigma: Some(1.5),
        chain_approximation: ChainApproximation::None,
        ..PipelineConfig::default()
    };
    let json = serde_json::to_string(&config).expect("serializes");
    assert!(json.contains("\"chain_approximation\":\"none\""));
    let parsed: PipelineConfig = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(parsed, config);

    // Missing fields fall back to defaults.
    let partial: PipelineConfig = serde_json::from_str(r#"{"tolerance": 0.02}"#).expect("partial");
    assert_eq!(partial, PipelineConfig::with_tolerance(0.02));
}

#[test]
fn two_vertex_diagonal_polygon_gives_two_curves() {
    let polygon = SimplifiedPolygon::new(vec![Point::new(0, 0), Point::new(10, 10)]);
    let segs = segments(&polygon);
    assert_eq!(segs.len(), 2);
    let equations: Vec<Equation> = segs.iter().map(|s| Equation::synthesize(s, 10)).collect();
    assert!(equations.iter().all(|e| matches!(e, Equation::ParametricCurve { .. })));
}

#[test]
fn single_diagonal_segment_renders_third_point_coefficients() {
    let eq = Equation::synthesize(&Segment::new(Point::new(0, 0), Point::new(10, 10)), 10);
    let line = eq.to_string();
    let x_expr = line
        .trim_start_matches("((")
        .split("), ")
        .next()
        .expect("x expression");
    let coefficients: Vec<f64> = x_expr
        .split(" + ")
        .map(|term| term.rsplit('*').next().and_then(|c| c.parse().ok()).expect("numeric coefficient"))
        .collect();
    assert_eq!(coefficients.len(), 4);
    assert_eq!(coefficients[0], 0.0);
    assert!((coefficients[1] - 3.33).abs() < 0.01);
    assert!((coefficients[2] - 6.67).abs() < 0.01);
    assert_eq!(coefficients[3], 10.0);
}

#[test]
fn degenerate_contours_contribute_nothing() {
    let mut sheet = EquationSheet::new();
    for contour in [Contour::default(), Contour::new(vec![Point::new(1, 1)])] {
        assert!(simplify(&contour, 0.01).is_none());
        assert_eq!(append_contour_equations(&contour, 0.01, 10, &mut sheet), None);
    }
    assert_eq!(sheet.render(), NO_EQUATIONS_FALLBACK);
}
