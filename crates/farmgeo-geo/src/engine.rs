use crate::models::{AreaProjection, Geometry, GeometryExt, LngLat};
use crate::{area, spatial, validation};
use farmgeo_core::error::Result;
use farmgeo_core::ports::GeometryEngine;

/// [`GeometryEngine`] backed by the `geo` and `proj4rs` crates
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoEngine;

impl GeoEngine {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryEngine for GeoEngine {
    fn close_ring(&self, field: &str, vertices: &[LngLat]) -> Result<Vec<LngLat>> {
        validation::close_ring(field, vertices)
    }

    fn validate_point(&self, lat: f64, lng: f64) -> Result<LngLat> {
        validation::validate_point(lat, lng)
    }

    fn centroid(&self, ring: &[LngLat]) -> Option<LngLat> {
        Geometry::from_ring(ring.to_vec()).centroid_coords()
    }

    fn covers(&self, boundary: &Geometry, point: LngLat) -> bool {
        spatial::covers(boundary, point)
    }

    fn intersects_disc(&self, boundary: &Geometry, center: LngLat, radius: f64) -> bool {
        spatial::intersects_disc(boundary, center, radius)
    }

    fn planar_area(&self, boundary: &Geometry) -> f64 {
        spatial::planar_area(boundary)
    }

    fn area_hectares(&self, ring: &[LngLat], projection: AreaProjection) -> Result<f64> {
        area::area_hectares(ring, projection)
    }
}
