//! Farm area measurement.
//!
//! Rings are reprojected from geographic coordinates into a metric planar CRS
//! with `proj4rs`, measured in square meters and reported in hectares.

use crate::models::{ring_to_polygon, AreaProjection, Crs, GeometryExt, LngLat};
use farmgeo_core::error::{FarmgeoError, Result};
use farmgeo_core::models::Geometry;
use geo::Area;
use proj4rs::{proj::Proj as Proj4, transform::transform};

const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";
const WEB_MERCATOR: &str = concat!(
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0",
    " +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs"
);

const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// PROJ.4 string for the WGS 84 UTM zone of a `[lng, lat]` position
fn utm_proj4(center: LngLat) -> String {
    let crs = Crs::utm_for(center[0], center[1]);
    let zone = crs.epsg % 100;
    let south = if center[1] >= 0.0 { "" } else { " +south" };
    format!("+proj=utm +zone={zone}{south} +datum=WGS84 +units=m +no_defs +type=crs")
}

fn build_proj(proj_string: &str) -> Result<Proj4> {
    Proj4::from_proj_string(proj_string).map_err(|e| FarmgeoError::AreaComputationFailed {
        reason: format!("failed to build projection '{}': {}", proj_string, e),
    })
}

/// Reproject a closed ring into the metric CRS selected by `projection`
pub fn project_ring(ring: &[LngLat], projection: AreaProjection) -> Result<Vec<LngLat>> {
    let from = build_proj(WGS84)?;
    let to = match projection {
        AreaProjection::WebMercator => build_proj(WEB_MERCATOR)?,
        AreaProjection::LocalUtm => {
            let center = Geometry::from_ring(ring.to_vec()).centroid_coords().ok_or_else(|| {
                FarmgeoError::AreaComputationFailed {
                    reason: "ring has no centroid".to_string(),
                }
            })?;
            build_proj(&utm_proj4(center))?
        }
    };

    // Radians in, meters out
    ring.iter()
        .map(|[lng, lat]| -> Result<LngLat> {
            let mut point = (lng.to_radians(), lat.to_radians(), 0.0);
            transform(&from, &to, &mut point).map_err(|e| FarmgeoError::AreaComputationFailed {
                reason: format!("projection of ({}, {}) failed: {}", lng, lat, e),
            })?;
            Ok([point.0, point.1])
        })
        .collect()
}

/// Area of a closed ring in hectares, rounded to 2 decimal places
pub fn area_hectares(ring: &[LngLat], projection: AreaProjection) -> Result<f64> {
    let projected = project_ring(ring, projection)?;
    let square_meters = ring_to_polygon(&projected).unsigned_area();

    if !square_meters.is_finite() {
        return Err(FarmgeoError::AreaComputationFailed {
            reason: format!("non-finite area {}", square_meters),
        });
    }

    Ok(round_hectares(square_meters / SQUARE_METERS_PER_HECTARE))
}

fn round_hectares(hectares: f64) -> f64 {
    (hectares * 100.0).round() / 100.0
}
