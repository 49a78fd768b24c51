//! Lambert-93 to WGS84 reprojection in pure Rust (proj4rs + crs-definitions).

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::error::{Result, RgeAltiError};

/// RGF93 / Lambert-93, the CRS of RGE ALTI tiles.
pub const LAMBERT_93: i32 = 2154;
/// WGS84 longitude/latitude.
pub const WGS84: i32 = 4326;

/// Converts projected coordinates to geographic ones with `always_xy`
/// ordering: input is (easting, northing), output is (longitude, latitude)
/// in degrees.
///
/// A `Reprojector` holds no mutable state; `project` only borrows it.
pub struct Reprojector {
    source: Proj,
    target: Proj,
    source_is_geographic: bool,
    target_is_geographic: bool,
}

impl std::fmt::Debug for Reprojector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reprojector")
            .field("source_is_geographic", &self.source_is_geographic)
            .field("target_is_geographic", &self.target_is_geographic)
            .finish_non_exhaustive()
    }
}

impl Reprojector {
    /// EPSG:2154 -> EPSG:4326.
    pub fn lambert93_to_wgs84() -> Result<Self> {
        Self::new(LAMBERT_93, WGS84)
    }

    pub fn new(source_epsg: i32, target_epsg: i32) -> Result<Self> {
        Ok(Self {
            source: load_proj(source_epsg)?,
            target: load_proj(target_epsg)?,
            source_is_geographic: is_geographic_crs(source_epsg),
            target_is_geographic: is_geographic_crs(target_epsg),
        })
    }

    /// Project one point. Geographic coordinates are in degrees on both sides.
    pub fn project(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        // proj4rs uses radians for geographic coordinates
        let mut point = if self.source_is_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(&self.source, &self.target, &mut point).map_err(|e| {
            RgeAltiError::Projection(format!("failed to transform ({}, {}): {:?}", x, y, e))
        })?;

        if self.target_is_geographic {
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        } else {
            Ok((point.0, point.1))
        }
    }
}

/// Project a single point between any two EPSG codes known to the
/// crs-definitions database.
pub fn project_point(source_epsg: i32, target_epsg: i32, x: f64, y: f64) -> Result<(f64, f64)> {
    if source_epsg == target_epsg {
        return Ok((x, y));
    }
    Reprojector::new(source_epsg, target_epsg)?.project(x, y)
}

/// PROJ.4 definition of an EPSG code.
pub fn get_proj_string(epsg: i32) -> Option<&'static str> {
    u16::try_from(epsg)
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
}

pub fn is_geographic_crs(epsg: i32) -> bool {
    get_proj_string(epsg).is_some_and(|proj| proj.contains("+proj=longlat"))
}

fn load_proj(epsg: i32) -> Result<Proj> {
    let definition = get_proj_string(epsg).ok_or_else(|| {
        RgeAltiError::Projection(format!(
            "EPSG:{} is not in the crs-definitions database",
            epsg
        ))
    })?;
    Proj::from_proj_string(definition)
        .map_err(|e| RgeAltiError::Projection(format!("invalid projection EPSG:{}: {:?}", epsg, e)))
}
