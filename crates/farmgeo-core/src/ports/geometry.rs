use crate::error::Result;
use crate::models::{AreaProjection, Geometry, LngLat};

/// Port for the geometry capabilities the registry relies on.
///
/// Keeps polygon construction, containment, buffering and area measurement
/// behind one seam so the registry never touches a geometry library directly.
pub trait GeometryEngine: Send + Sync {
    /// Validate raw `[lng, lat]` vertices and return the closed exterior ring.
    ///
    /// `field` names the input being validated in the returned error.
    fn close_ring(&self, field: &str, vertices: &[LngLat]) -> Result<Vec<LngLat>>;

    /// Validate a `(lat, lng)` pair and return it as `[lng, lat]`
    fn validate_point(&self, lat: f64, lng: f64) -> Result<LngLat>;

    /// Centroid of a closed ring
    fn centroid(&self, ring: &[LngLat]) -> Option<LngLat>;

    /// Whether the point lies in the interior or on the boundary
    fn covers(&self, boundary: &Geometry, point: LngLat) -> bool;

    /// Whether a disc of `radius` (in degrees) around `center` touches the boundary
    fn intersects_disc(&self, boundary: &Geometry, center: LngLat, radius: f64) -> bool;

    /// Area in squared degrees; only meaningful for comparing boundaries
    fn planar_area(&self, boundary: &Geometry) -> f64;

    /// Area of a closed ring in hectares, rounded to 2 decimal places
    fn area_hectares(&self, ring: &[LngLat], projection: AreaProjection) -> Result<f64>;
}
