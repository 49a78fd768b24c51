//! Tile processing pipeline.
//!
//! Files are processed in two ordered stages per batch:
//!
//! 1. analysis: parse the grid and compute its statistics. Tiles are
//!    independent here, so a batch may run on the rayon pool;
//! 2. sampling: strictly in path order against the run generator.
//!
//! Batches are `rayon::current_num_threads()` files wide so that only one
//! batch of raw grids is held in memory at a time. Results do not depend on
//! whether analysis ran in parallel.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{Result, RgeAltiError};
use crate::model::{GridTile, SamplePoint, TileStatistics};
use crate::parser::parse_asc_file;
use crate::projection::Reprojector;
use crate::sampler::{RandomSampler, SamplingMode, DEFAULT_SAMPLES_PER_TILE, DEFAULT_SEED};
use crate::statistics::compute_statistics;

/// What to do when a tile cannot be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop the run at the first failing tile.
    #[default]
    Abort,
    /// Log the failure, record it in [`TileResults::skipped`] and continue.
    Skip,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub seed: u64,
    pub samples_per_tile: usize,
    pub error_policy: ErrorPolicy,
    pub sampling: SamplingMode,
    /// Run the analysis stage on the rayon thread pool.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            samples_per_tile: DEFAULT_SAMPLES_PER_TILE,
            error_policy: ErrorPolicy::Abort,
            sampling: SamplingMode::Sequential,
            parallel: true,
        }
    }
}

/// A tile dropped under [`ErrorPolicy::Skip`].
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTile {
    pub file: String,
    pub reason: String,
}

/// Accumulated records of a run, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileResults {
    pub tiles: Vec<TileStatistics>,
    pub samples: Vec<SamplePoint>,
    pub skipped: Vec<SkippedTile>,
}

/// `.asc` files directly inside `dir`, sorted by path.
pub fn collect_asc_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_error = |source| RgeAltiError::ReadFile {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        let is_asc = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("asc"));
        if is_asc && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// File name used as the tile identifier in every output table.
pub fn tile_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

struct AnalyzedTile {
    file: String,
    tile: GridTile,
    stats: TileStatistics,
}

fn analyze_tile(path: &Path, reprojector: &Reprojector) -> Result<AnalyzedTile> {
    let file = tile_name(path);
    let tile = parse_asc_file(path).map_err(|e| e.in_tile(&file))?;
    let stats = compute_statistics(&file, &tile, reprojector).map_err(|e| e.in_tile(&file))?;
    Ok(AnalyzedTile { file, tile, stats })
}

pub struct TileProcessingPipeline {
    config: PipelineConfig,
    reprojector: Reprojector,
    sampler: RandomSampler,
}

impl TileProcessingPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let reprojector = Reprojector::lambert93_to_wgs84()?;
        let sampler = RandomSampler::new(config.seed, config.sampling, config.samples_per_tile);
        Ok(Self {
            config,
            reprojector,
            sampler,
        })
    }

    /// Process every `.asc` tile of `dir`.
    pub fn run_directory(&mut self, dir: &Path) -> Result<TileResults> {
        let files = collect_asc_files(dir)?;
        if files.is_empty() {
            return Err(RgeAltiError::NoInputFiles(dir.to_path_buf()));
        }
        info!("Found {} tiles to process in {:?}", files.len(), dir);
        self.run(&files)
    }

    /// Process `paths` in the given order.
    pub fn run(&mut self, paths: &[PathBuf]) -> Result<TileResults> {
        let mut results = TileResults::default();
        let batch_size = if self.config.parallel {
            rayon::current_num_threads().max(1)
        } else {
            1
        };

        let total = paths.len();
        let mut done = 0;
        for batch in paths.chunks(batch_size) {
            let analyzed = self.analyze_batch(batch);
            for (path, outcome) in batch.iter().zip(analyzed) {
                done += 1;
                info!("[{}/{}] {}", done, total, tile_name(path));
                let outcome = outcome.and_then(|tile| self.sample(tile));
                self.absorb(path, outcome, &mut results)?;
            }
        }

        info!(
            "Processed {} tiles ({} samples, {} skipped)",
            results.tiles.len(),
            results.samples.len(),
            results.skipped.len()
        );
        Ok(results)
    }

    fn analyze_batch(&self, batch: &[PathBuf]) -> Vec<Result<AnalyzedTile>> {
        if self.config.parallel && batch.len() > 1 {
            // one Reprojector per worker
            batch
                .par_iter()
                .map_init(Reprojector::lambert93_to_wgs84, |reprojector, path| {
                    match reprojector {
                        Ok(reprojector) => analyze_tile(path, reprojector),
                        Err(e) => Err(RgeAltiError::Projection(e.to_string())),
                    }
                })
                .collect()
        } else {
            batch
                .iter()
                .map(|path| analyze_tile(path, &self.reprojector))
                .collect()
        }
    }

    fn sample(&mut self, analyzed: AnalyzedTile) -> Result<(TileStatistics, Vec<SamplePoint>)> {
        let samples = self
            .sampler
            .sample(&analyzed.file, &analyzed.tile, &self.reprojector)
            .map_err(|e| e.in_tile(&analyzed.file))?;
        debug!("{}: drew {} samples", analyzed.file, samples.len());
        Ok((analyzed.stats, samples))
    }

    fn absorb(
        &self,
        path: &Path,
        outcome: Result<(TileStatistics, Vec<SamplePoint>)>,
        results: &mut TileResults,
    ) -> Result<()> {
        match outcome {
            Ok((stats, samples)) => {
                results.tiles.push(stats);
                results.samples.extend(samples);
                Ok(())
            }
            Err(err) => match self.config.error_policy {
                ErrorPolicy::Abort => Err(err),
                ErrorPolicy::Skip => {
                    warn!("Skipping {:?}: {}", path, err);
                    results.skipped.push(SkippedTile {
                        file: tile_name(path),
                        reason: err.to_string(),
                    });
                    Ok(())
                }
            },
        }
    }
}
