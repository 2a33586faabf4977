use anyhow::{Context, Result};
use clap::Parser;
use contour_equations::core_modules::contour_extractor::ChainApproximation;
use contour_equations::parallel_pipeline::{ParallelConfig, ParallelPipeline};
use contour_equations::{PipelineConfig, parse_tolerance};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Convert images into graphing-calculator equations that retrace their edges
#[derive(Parser, Debug)]
#[command(name = "contour-equations")]
#[command(about = "Turn image edges into line and parametric-curve equations", long_about = None)]
struct Args {
    /// Input image files (PNG or JPEG)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Inaccuracy value: fraction of each contour's perimeter (0.001-0.05 recommended)
    #[arg(short = 'k', long, value_parser = parse_tolerance)]
    tolerance: Option<f64>,

    /// JSON file with a serialized pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gaussian smoothing kernel size (odd)
    #[arg(long)]
    blur_kernel: Option<u32>,

    /// Gaussian sigma (derived from the kernel size when omitted)
    #[arg(long)]
    blur_sigma: Option<f32>,

    /// Canny low threshold
    #[arg(long)]
    canny_low: Option<f32>,

    /// Canny high threshold
    #[arg(long)]
    canny_high: Option<f32>,

    /// Contour point compression
    #[arg(long, value_enum)]
    chain: Option<ChainArg>,

    /// Write one <stem>.txt per image into this directory instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of worker tasks (defaults to the CPU count)
    #[arg(long)]
    workers: Option<usize>,

    /// Per-image time limit in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ChainArg {
    Simple,
    None,
}

impl From<ChainArg> for ChainApproximation {
    fn from(arg: ChainArg) -> Self {
        match arg {
            ChainArg::Simple => ChainApproximation::Simple,
            ChainArg::None => ChainApproximation::None,
        }
    }
}

/// Builds the pipeline config: defaults, then the config file, then explicit flags.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(size) = args.blur_kernel {
        config.blur_kernel_size = size;
    }
    if args.blur_sigma.is_some() {
        config.blur_sigma = args.blur_sigma;
    }
    if let Some(low) = args.canny_low {
        config.canny_low = low;
    }
    if let Some(high) = args.canny_high {
        config.canny_high = high;
    }
    if let Some(chain) = args.chain {
        config.chain_approximation = chain.into();
    }

    config.validate()?;
    Ok(config)
}

fn output_path(dir: &Path, image: &Path) -> PathBuf {
    let mut name = image.file_stem().map_or_else(|| "image".into(), |s| s.to_os_string());
    name.push(".txt");
    dir.join(name)
}

/// Runs every readable input through the pool and emits results in input order.
///
/// Unreadable inputs, failed images and failed writes are reported on `errors` as
/// `error: <path>: <kind>: <message>` and do not stop the rest. Returns the failure count.
async fn run_batch(
    args: &Args,
    pipeline: &ParallelPipeline,
    out: &mut impl Write,
    errors: &mut impl Write,
) -> Result<usize> {
    // --- 1. Read Inputs ---
    let mut batch = Vec::with_capacity(args.images.len());
    let mut read_errors = Vec::with_capacity(args.images.len());
    for path in &args.images {
        match std::fs::read(path) {
            Ok(bytes) => {
                batch.push(bytes);
                read_errors.push(None);
            }
            Err(err) => read_errors.push(Some(err)),
        }
    }

    // --- 2. Process ---
    let mut results = pipeline.process_batch(batch).await.into_iter();

    // --- 3. Emit Results ---
    let labelled = args.output.is_none() && args.images.len() > 1;
    let mut failures = 0;
    for (path, read_error) in args.images.iter().zip(read_errors) {
        let outcome = match read_error {
            Some(err) => Err(format!("read error: {err}")),
            None => match results.next() {
                Some(Ok(report)) => match &args.output {
                    Some(dir) => {
                        let target = output_path(dir, path);
                        match std::fs::write(&target, report.text()) {
                            Ok(()) => {
                                info!(
                                    image = %path.display(),
                                    equations = report.sheet.len(),
                                    output = %target.display(),
                                    "written"
                                );
                                Ok(())
                            }
                            Err(err) => Err(format!("write error: {}: {err}", target.display())),
                        }
                    }
                    None => {
                        if labelled {
                            writeln!(out, "# {}", path.display())?;
                        }
                        writeln!(out, "{}", report.text())?;
                        Ok(())
                    }
                },
                Some(Err(err)) => Err(format!("{}: {}", err.kind(), err.message())),
                None => Err("processing error: no result returned".to_string()),
            },
        };
        if let Err(message) = outcome {
            failures += 1;
            writeln!(errors, "error: {}: {message}", path.display())?;
        }
    }
    Ok(failures)
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Logging & Argument Parsing ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    // --- 2. Worker Pool Initialization ---
    let mut parallel = ParallelConfig::default();
    if let Some(workers) = args.workers {
        parallel.worker_count = workers;
    }
    parallel.timeout = args.timeout_secs.map(Duration::from_secs);
    let pipeline = ParallelPipeline::new(config, parallel);
    info!(
        images = args.images.len(),
        workers = pipeline.worker_count(),
        tolerance = pipeline.config().tolerance,
        "starting"
    );

    // --- 3. Run ---
    if let Some(dir) = &args.output {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let failures = run_batch(&args, &pipeline, &mut std::io::stdout(), &mut std::io::stderr()).await?;

    if failures > 0 {
        anyhow::bail!("{failures} of {} image(s) failed", args.images.len());
    }
    Ok(())
}
