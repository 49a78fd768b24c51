use serde::{Deserialize, Serialize};

/// Header of an ESRI ASCII grid (`.asc`) tile.
///
/// Coordinates are Lambert-93 (EPSG:2154) metres; `xllcorner`/`yllcorner` is
/// the outer lower-left corner of the grid, not the centre of a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHeader {
    pub ncols: usize,
    pub nrows: usize,
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub cellsize: f64,
    pub nodata_value: f64,
}

impl GridHeader {
    /// Number of cells, or `None` if `nrows * ncols` overflows `usize`.
    pub fn cell_count(&self) -> Option<usize> {
        self.nrows.checked_mul(self.ncols)
    }

    /// Ground rectangle covered by the tile.
    pub fn bounds(&self) -> Bounds {
        Bounds {
            xmin: self.xllcorner,
            ymin: self.yllcorner,
            xmax: self.xllcorner + self.ncols as f64 * self.cellsize,
            ymax: self.yllcorner + self.nrows as f64 * self.cellsize,
        }
    }

    /// Projected coordinate of the centre of cell `(row, col)`.
    ///
    /// Row 0 is the northernmost row while Y grows northward from the
    /// lower-left corner, hence the flip.
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        let x = self.xllcorner + (col as f64 + 0.5) * self.cellsize;
        let y = self.yllcorner + (self.nrows as f64 - row as f64 - 0.5) * self.cellsize;
        (x, y)
    }
}

/// Axis-aligned bounding box in Lambert-93.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Bounds {
    pub fn center(&self) -> (f64, f64) {
        ((self.xmin + self.xmax) / 2.0, (self.ymin + self.ymax) / 2.0)
    }
}

/// One parsed elevation tile.
///
/// `values` and `valid_mask` are row-major, `nrows * ncols` long, first row
/// northernmost.
#[derive(Debug, Clone)]
pub struct GridTile {
    pub header: GridHeader,
    pub values: Vec<f32>,
    pub valid_mask: Vec<bool>,
}

impl GridTile {
    /// Build a tile and derive its validity mask from the nodata sentinel.
    ///
    /// The sentinel is compared at the 32-bit precision of the samples.
    pub fn new(header: GridHeader, values: Vec<f32>) -> Self {
        let nodata = header.nodata_value as f32;
        let valid_mask = values.iter().map(|&v| v != nodata).collect();
        Self {
            header,
            values,
            valid_mask,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.header.nrows, self.header.ncols)
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.header.ncols + col
    }

    pub fn value(&self, row: usize, col: usize) -> f32 {
        self.values[self.index(row, col)]
    }

    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.valid_mask[self.index(row, col)]
    }

    pub fn valid_count(&self) -> usize {
        self.valid_mask.iter().filter(|&&valid| valid).count()
    }

    pub fn nodata_count(&self) -> usize {
        self.valid_mask.len() - self.valid_count()
    }

    /// Iterator over the valid elevations.
    pub fn valid_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.values
            .iter()
            .zip(&self.valid_mask)
            .filter_map(|(&v, &valid)| valid.then_some(v))
    }

    /// `(row, col)` of every valid cell, in row-major order.
    pub fn valid_indices(&self) -> Vec<(usize, usize)> {
        let ncols = self.header.ncols;
        self.valid_mask
            .iter()
            .enumerate()
            .filter(|(_, &valid)| valid)
            .map(|(i, _)| (i / ncols, i % ncols))
            .collect()
    }

    pub fn bounds(&self) -> Bounds {
        self.header.bounds()
    }

    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.header.pixel_center(row, col)
    }
}

/// Summary of one tile, one row of `tile_statistics.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileStatistics {
    pub file: String,
    pub min_altitude_m: f64,
    pub max_altitude_m: f64,
    pub mean_altitude_m: f64,
    pub centroid_x_l93: f64,
    pub centroid_y_l93: f64,
    pub centroid_lon: f64,
    pub centroid_lat: f64,
    pub xmin_l93: f64,
    pub ymin_l93: f64,
    pub xmax_l93: f64,
    pub ymax_l93: f64,
    pub valid_pixels: usize,
    pub nodata_pixels: usize,
}

/// A randomly drawn valid cell, one row of `sample_points.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub file: String,
    pub row: usize,
    pub col: usize,
    pub altitude_m: f64,
    pub x_l93: f64,
    pub y_l93: f64,
    pub lon: f64,
    pub lat: f64,
    pub is_sample: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(nrows: usize, ncols: usize) -> GridHeader {
        GridHeader {
            ncols,
            nrows,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 1.0,
            nodata_value: -9999.0,
        }
    }

    #[test]
    fn test_top_row_maps_to_highest_y() {
        let h = header(5, 3);
        assert_eq!(h.pixel_center(0, 0), (0.5, 4.5));
        assert_eq!(h.pixel_center(4, 2), (2.5, 0.5));
    }

    #[test]
    fn test_cell_count_overflow() {
        assert_eq!(header(5, 3).cell_count(), Some(15));
        assert_eq!(header(usize::MAX, 2).cell_count(), None);
    }

    #[test]
    fn test_bounds_and_center() {
        let h = GridHeader {
            ncols: 1000,
            nrows: 1000,
            xllcorner: 643_999.5,
            yllcorner: 6_857_000.5,
            cellsize: 1.0,
            nodata_value: -99999.0,
        };
        let b = h.bounds();
        assert_eq!(b.xmax, 644_999.5);
        assert_eq!(b.ymax, 6_858_000.5);
        assert_eq!(b.center(), (644_499.5, 6_857_500.5));
    }

    #[test]
    fn test_mask_and_counts() {
        let tile = GridTile::new(header(2, 2), vec![10.0, 20.0, -9999.0, 40.0]);
        assert_eq!(tile.shape(), (2, 2));
        assert_eq!(tile.valid_count(), 3);
        assert_eq!(tile.nodata_count(), 1);
        assert!(!tile.is_valid(1, 0));
        assert_eq!(tile.value(1, 1), 40.0);
        assert_eq!(tile.valid_indices(), vec![(0, 0), (0, 1), (1, 1)]);
        assert_eq!(tile.valid_values().collect::<Vec<_>>(), vec![10.0, 20.0, 40.0]);
    }
}
