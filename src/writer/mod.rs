use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RgeAltiError};
use crate::model::{SamplePoint, TileStatistics};
use crate::pipeline::TileResults;

pub const TILE_STATISTICS_FILE: &str = "tile_statistics.csv";
pub const SAMPLE_POINTS_FILE: &str = "sample_points.csv";
pub const COMBINED_OUTPUT_FILE: &str = "combined_output.csv";

/// One row of `combined_output.csv`: either a tile (mean altitude at the
/// centroid) or a sample point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRow {
    pub file: String,
    pub altitude_m: f64,
    pub x_l93: f64,
    pub y_l93: f64,
    pub lon: f64,
    pub lat: f64,
    pub is_sample: bool,
}

impl From<&TileStatistics> for CombinedRow {
    fn from(tile: &TileStatistics) -> Self {
        Self {
            file: tile.file.clone(),
            altitude_m: tile.mean_altitude_m,
            x_l93: tile.centroid_x_l93,
            y_l93: tile.centroid_y_l93,
            lon: tile.centroid_lon,
            lat: tile.centroid_lat,
            is_sample: false,
        }
    }
}

impl From<&SamplePoint> for CombinedRow {
    fn from(sample: &SamplePoint) -> Self {
        Self {
            file: sample.file.clone(),
            altitude_m: sample.altitude_m,
            x_l93: sample.x_l93,
            y_l93: sample.y_l93,
            lon: sample.lon,
            lat: sample.lat,
            is_sample: sample.is_sample,
        }
    }
}

/// Tile rows first, then every sample row.
pub fn combined_rows(results: &TileResults) -> Vec<CombinedRow> {
    results
        .tiles
        .iter()
        .map(CombinedRow::from)
        .chain(results.samples.iter().map(CombinedRow::from))
        .collect()
}

/// Paths of the files written by [`CsvExporter::export`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub tile_statistics: PathBuf,
    pub sample_points: PathBuf,
    pub combined: PathBuf,
}

/// Writes the accumulated results as CSV files with a header row.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn export(&self, results: &TileResults) -> Result<ExportPaths> {
        // Create output directory
        fs::create_dir_all(&self.output_dir).map_err(|source| RgeAltiError::WriteFile {
            path: self.output_dir.clone(),
            source,
        })?;

        let paths = ExportPaths {
            tile_statistics: self.output_dir.join(TILE_STATISTICS_FILE),
            sample_points: self.output_dir.join(SAMPLE_POINTS_FILE),
            combined: self.output_dir.join(COMBINED_OUTPUT_FILE),
        };

        write_csv(&paths.tile_statistics, &results.tiles)?;
        tracing::info!(
            "Written {} tile rows: {:?}",
            results.tiles.len(),
            paths.tile_statistics
        );

        write_csv(&paths.sample_points, &results.samples)?;
        tracing::info!(
            "Written {} sample rows: {:?}",
            results.samples.len(),
            paths.sample_points
        );

        let combined = combined_rows(results);
        write_csv(&paths.combined, &combined)?;
        tracing::info!("Written {} combined rows: {:?}", combined.len(), paths.combined);

        Ok(paths)
    }
}

/// Record types with a fixed column set.
pub trait CsvRecord: Serialize {
    const HEADER: &'static [&'static str];
}

impl CsvRecord for TileStatistics {
    const HEADER: &'static [&'static str] = &[
        "file",
        "min_altitude_m",
        "max_altitude_m",
        "mean_altitude_m",
        "centroid_x_l93",
        "centroid_y_l93",
        "centroid_lon",
        "centroid_lat",
        "xmin_l93",
        "ymin_l93",
        "xmax_l93",
        "ymax_l93",
        "valid_pixels",
        "nodata_pixels",
    ];
}

impl CsvRecord for SamplePoint {
    const HEADER: &'static [&'static str] = &[
        "file",
        "row",
        "col",
        "altitude_m",
        "x_l93",
        "y_l93",
        "lon",
        "lat",
        "is_sample",
    ];
}

impl CsvRecord for CombinedRow {
    const HEADER: &'static [&'static str] =
        &["file", "altitude_m", "x_l93", "y_l93", "lon", "lat", "is_sample"];
}

fn write_csv<T: CsvRecord>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    // header is written even when there are no rows
    writer.write_record(T::HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
