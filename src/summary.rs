use std::fmt;

use crate::pipeline::TileResults;

/// Run-wide figures over all processed tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub tiles_processed: usize,
    pub tiles_skipped: usize,
    pub sample_count: usize,
    pub min_altitude_m: Option<f64>,
    pub max_altitude_m: Option<f64>,
    /// Mean of the per-tile means, not weighted by valid pixel count.
    pub mean_altitude_m: Option<f64>,
    pub lat_range: Option<(f64, f64)>,
    pub lon_range: Option<(f64, f64)>,
}

impl RunSummary {
    pub fn from_results(results: &TileResults) -> Self {
        let tiles = &results.tiles;
        let min_altitude_m = range(tiles.iter().map(|t| t.min_altitude_m)).map(|r| r.0);
        let max_altitude_m = range(tiles.iter().map(|t| t.max_altitude_m)).map(|r| r.1);
        let mean_altitude_m = (!tiles.is_empty()).then(|| {
            tiles.iter().map(|t| t.mean_altitude_m).sum::<f64>() / tiles.len() as f64
        });

        Self {
            tiles_processed: tiles.len(),
            tiles_skipped: results.skipped.len(),
            sample_count: results.samples.len(),
            min_altitude_m,
            max_altitude_m,
            mean_altitude_m,
            lat_range: range(tiles.iter().map(|t| t.centroid_lat)),
            lon_range: range(tiles.iter().map(|t| t.centroid_lon)),
        }
    }
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None::<(f64, f64)>, |range, v| match range {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    })
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tiles processed: {}", self.tiles_processed)?;
        if self.tiles_skipped > 0 {
            writeln!(f, "Tiles skipped: {}", self.tiles_skipped)?;
        }
        writeln!(f, "Sample points: {}", self.sample_count)?;
        if let (Some(min), Some(max), Some(mean)) =
            (self.min_altitude_m, self.max_altitude_m, self.mean_altitude_m)
        {
            writeln!(f, "Global min altitude: {:.2} m", min)?;
            writeln!(f, "Global max altitude: {:.2} m", max)?;
            writeln!(f, "Global mean altitude: {:.2} m", mean)?;
        }
        if let (Some((lat_lo, lat_hi)), Some((lon_lo, lon_hi))) = (self.lat_range, self.lon_range) {
            writeln!(f, "Latitude range: {:.4}° - {:.4}°", lat_lo, lat_hi)?;
            write!(f, "Longitude range: {:.4}° - {:.4}°", lon_lo, lon_hi)?;
        }
        Ok(())
    }
}
