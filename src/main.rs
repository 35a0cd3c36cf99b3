use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use demosaic_dataset_rs::image_pipeline::{
    DatasetConfig, DcrawReader, PoissonGaussianEstimator, RawDecoder, RawLoaderReader,
    RawToPairPipeline, StandardTiffWriter, conversions::types::DEFAULT_BLOCK_SIZE,
    generate_dataset,
};
use demosaic_dataset_rs::logger;

use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Decoder {
    /// Decode in-process with rawloader
    Rawloader,
    /// Run the external dcraw tool
    Dcraw,
}

/// Demosaicing dataset generator.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Extension of raw images to process (repeatable)
    #[arg(short = 'e', long = "extension", required = true)]
    extensions: Vec<String>,

    /// Block size, must be an integer >= 2
    #[arg(short = 's', long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Delete the result directories if they already exist. Use carefully
    #[arg(short = 'f', long)]
    force: bool,

    /// Add synthetic sensor noise to input images
    #[arg(short = 'n', long)]
    add_noise: bool,

    /// Seed for reproducible noise
    #[arg(long)]
    seed: Option<u64>,

    /// Process the tiles of each image in parallel
    #[arg(long)]
    parallel: bool,

    /// Raw decoder to use
    #[arg(long, value_enum, default_value_t = Decoder::Rawloader)]
    decoder: Decoder,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    /// Directory to search raw images in
    directory: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(if args.verbose { "debug" } else { "info" });

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<bool> {
    let config = DatasetConfig::builder()
        .block_size(args.block_size)
        .add_noise(args.add_noise)
        .noise_seed(args.seed)
        .parallel_tiles(args.parallel)
        .build();

    info!("Block size: {}", config.block_size);
    info!(
        "Noise injection: {}",
        if config.add_noise { "enabled" } else { "disabled" }
    );

    match args.decoder {
        Decoder::Rawloader => generate(RawLoaderReader, config, args),
        Decoder::Dcraw => generate(DcrawReader::default(), config, args),
    }
}

fn generate<R: RawDecoder>(reader: R, config: DatasetConfig, args: &Args) -> anyhow::Result<bool> {
    let pipeline = RawToPairPipeline::with_custom(
        reader,
        StandardTiffWriter,
        PoissonGaussianEstimator::default(),
        config,
    )
    .context("invalid configuration")?;

    let report = generate_dataset(&pipeline, &args.directory, &args.extensions, args.force)
        .with_context(|| format!("failed to generate dataset in {}", args.directory.display()))?;

    for (path, e) in &report.failed {
        error!("{}: {}", path.display(), e);
    }
    info!(
        "{} pair(s) written, {} file(s) failed",
        report.succeeded.len(),
        report.failed.len()
    );
    Ok(report.is_success())
}
