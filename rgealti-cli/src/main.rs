use anyhow::{Context, Result};
use clap::Parser;
use rayon::ThreadPoolBuilder;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use rgealti::{
    CsvExporter, ErrorPolicy, PipelineConfig, RunSummary, SamplingMode, TileProcessingPipeline,
};

const DEFAULT_DATA_DIR: [&str; 5] = [
    "Downloads",
    "RGEALTI_2-0_1M_ASC_LAMB93-IGN69_D075_2020-07-30",
    "RGEALTI",
    "1_DONNEES_LIVRAISON_2021-01-00157",
    "RGEALTI_MNT_1M_ASC_LAMB93_IGN69_D075_20210118",
];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of RGE ALTI MNT .asc tiles
    #[arg(value_name = "DATA_DIR", default_value_os_t = default_data_dir())]
    data_dir: PathBuf,

    /// Output directory for the CSV files (default: parent of DATA_DIR)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Number of threads for tile parsing (default: number of CPU cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Seed of the sampling generator
    #[arg(long, default_value_t = rgealti::sampler::DEFAULT_SEED)]
    seed: u64,

    /// Maximum number of sample points per tile
    #[arg(long, default_value_t = rgealti::sampler::DEFAULT_SAMPLES_PER_TILE)]
    samples_per_tile: usize,

    /// Skip tiles that fail to parse or have no valid cells instead of aborting
    #[arg(long)]
    skip_invalid: bool,

    /// Seed each tile independently (samples no longer depend on tile order)
    #[arg(long)]
    per_tile_seed: bool,
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    DEFAULT_DATA_DIR.iter().fold(home, |path, part| path.join(part))
}

fn main() -> Result<()> {
    // Logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    // Start timer
    let start_time = std::time::Instant::now();

    // Thread pool
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to build thread pool")?;
    }

    if !args.data_dir.is_dir() {
        error!("Invalid input path: {:?}", args.data_dir);
        anyhow::bail!("Input path must be a directory of .asc tiles");
    }
    info!("Data directory: {:?}", args.data_dir);

    let config = PipelineConfig {
        seed: args.seed,
        samples_per_tile: args.samples_per_tile,
        error_policy: if args.skip_invalid {
            ErrorPolicy::Skip
        } else {
            ErrorPolicy::Abort
        },
        sampling: if args.per_tile_seed {
            SamplingMode::PerTile
        } else {
            SamplingMode::Sequential
        },
        parallel: true,
    };

    let mut pipeline = TileProcessingPipeline::new(config)?;
    let results = pipeline.run_directory(&args.data_dir)?;

    for skipped in &results.skipped {
        error!("  {}: {}", skipped.file, skipped.reason);
    }

    // Output defaults to the parent of the input directory
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| output_dir_for(&args.data_dir));
    let paths = CsvExporter::new(&output_dir).export(&results)?;

    info!("Exported CSVs:");
    info!("  {:?}", paths.tile_statistics);
    info!("  {:?}", paths.sample_points);
    info!("  {:?} (tiles + samples with is_sample flag)", paths.combined);

    for line in RunSummary::from_results(&results).to_string().lines() {
        info!("{}", line);
    }

    // Elapsed time
    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    Ok(())
}

fn output_dir_for(data_dir: &Path) -> PathBuf {
    data_dir
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
