use crate::error::{Result, RgeAltiError};
use crate::model::{GridTile, TileStatistics};
use crate::projection::Reprojector;

/// Elevation statistics, bounding box and centroid of one tile.
///
/// Only cells flagged valid take part in min/max/mean. A tile without any
/// valid cell has no defined statistics and yields
/// [`RgeAltiError::DegenerateTile`].
pub fn compute_statistics(
    file: &str,
    tile: &GridTile,
    reprojector: &Reprojector,
) -> Result<TileStatistics> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0f64;
    let mut valid = 0usize;

    for value in tile.valid_values() {
        min = min.min(value);
        max = max.max(value);
        sum += value as f64;
        valid += 1;
    }

    if valid == 0 {
        return Err(RgeAltiError::DegenerateTile);
    }

    let bounds = tile.bounds();
    let (centroid_x, centroid_y) = bounds.center();
    let (centroid_lon, centroid_lat) = reprojector.project(centroid_x, centroid_y)?;

    Ok(TileStatistics {
        file: file.to_string(),
        min_altitude_m: min as f64,
        max_altitude_m: max as f64,
        mean_altitude_m: sum / valid as f64,
        centroid_x_l93: centroid_x,
        centroid_y_l93: centroid_y,
        centroid_lon,
        centroid_lat,
        xmin_l93: bounds.xmin,
        ymin_l93: bounds.ymin,
        xmax_l93: bounds.xmax,
        ymax_l93: bounds.ymax,
        valid_pixels: valid,
        nodata_pixels: tile.valid_mask.len() - valid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GridHeader;

    fn tile(nrows: usize, ncols: usize, xll: f64, yll: f64, values: Vec<f32>) -> GridTile {
        GridTile::new(
            GridHeader {
                ncols,
                nrows,
                xllcorner: xll,
                yllcorner: yll,
                cellsize: 1.0,
                nodata_value: -9999.0,
            },
            values,
        )
    }

    #[test]
    fn test_two_by_two_scenario() {
        let proj = Reprojector::lambert93_to_wgs84().unwrap();
        let t = tile(2, 2, 0.0, 0.0, vec![10.0, 20.0, -9999.0, 40.0]);
        let stats = compute_statistics("a.asc", &t, &proj).unwrap();

        assert_eq!(stats.file, "a.asc");
        assert_eq!(stats.valid_pixels, 3);
        assert_eq!(stats.nodata_pixels, 1);
        assert_eq!(stats.min_altitude_m, 10.0);
        assert_eq!(stats.max_altitude_m, 40.0);
        assert!((stats.mean_altitude_m - 70.0 / 3.0).abs() < 1e-9);
        assert_eq!((stats.centroid_x_l93, stats.centroid_y_l93), (1.0, 1.0));
        assert_eq!(
            (stats.xmin_l93, stats.ymin_l93, stats.xmax_l93, stats.ymax_l93),
            (0.0, 0.0, 2.0, 2.0)
        );
    }

    #[test]
    fn test_min_mean_max_ordering() {
        let proj = Reprojector::lambert93_to_wgs84().unwrap();
        let values: Vec<f32> = (0..12).map(|i| 30.0 + (i as f32 * 7.3) % 11.0).collect();
        let t = tile(3, 4, 652_000.0, 6_862_000.0, values);
        let stats = compute_statistics("b.asc", &t, &proj).unwrap();

        assert!(stats.min_altitude_m <= stats.mean_altitude_m);
        assert!(stats.mean_altitude_m <= stats.max_altitude_m);
        assert_eq!(stats.valid_pixels + stats.nodata_pixels, 12);
        assert_eq!(stats.nodata_pixels, 0);
    }

    #[test]
    fn test_geographic_centroid_uses_projection() {
        let proj = Reprojector::lambert93_to_wgs84().unwrap();
        let t = tile(2, 2, 699_999.0, 6_599_999.0, vec![1.0; 4]);
        let stats = compute_statistics("c.asc", &t, &proj).unwrap();

        assert_eq!((stats.centroid_x_l93, stats.centroid_y_l93), (700_000.0, 6_600_000.0));
        assert!((stats.centroid_lon - 3.0).abs() < 1e-6);
        assert!((stats.centroid_lat - 46.5).abs() < 1e-6);
    }

    #[test]
    fn test_all_nodata_tile_is_degenerate() {
        let proj = Reprojector::lambert93_to_wgs84().unwrap();
        let t = tile(2, 2, 0.0, 0.0, vec![-9999.0; 4]);
        let err = compute_statistics("empty.asc", &t, &proj).unwrap_err();
        assert!(matches!(err, RgeAltiError::DegenerateTile));
    }
}
