//! Geometry models for farmgeo-geo.
//!
//! Re-exports the canonical types from `farmgeo-core` and converts them into
//! the `geo` crate's types.

use geo::Geometry as GeoGeometry;

pub use farmgeo_core::models::{AreaProjection, Crs, Geometry, LngLat};

fn to_line_string(ring: &[LngLat]) -> geo::LineString {
    geo::LineString::new(ring.iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect())
}

fn to_polygon(rings: &[Vec<LngLat>]) -> geo::Polygon {
    match rings.split_first() {
        Some((exterior, interiors)) => geo::Polygon::new(
            to_line_string(exterior),
            interiors.iter().map(|ring| to_line_string(ring)).collect(),
        ),
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

/// Polygon with a single exterior ring
pub fn ring_to_polygon(ring: &[LngLat]) -> geo::Polygon {
    geo::Polygon::new(to_line_string(ring), vec![])
}

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry {
    match geom {
        Geometry::Point { coordinates } => {
            GeoGeometry::Point(geo::Point::new(coordinates[0], coordinates[1]))
        }
        Geometry::Polygon { coordinates } => GeoGeometry::Polygon(to_polygon(coordinates)),
        Geometry::MultiPolygon { coordinates } => GeoGeometry::MultiPolygon(geo::MultiPolygon::new(
            coordinates.iter().map(|poly| to_polygon(poly)).collect(),
        )),
    }
}

/// Extension trait for Geometry with geo-crate operations
pub trait GeometryExt {
    /// Convert to geo::Geometry
    fn to_geo(&self) -> GeoGeometry;

    /// Get the centroid as coordinates
    fn centroid_coords(&self) -> Option<LngLat>;

    /// Bounding box as `(min, max)` corners
    fn bounding_box(&self) -> Option<(LngLat, LngLat)>;
}

impl GeometryExt for Geometry {
    fn to_geo(&self) -> GeoGeometry {
        to_geo_geometry(self)
    }

    fn centroid_coords(&self) -> Option<LngLat> {
        use geo::algorithm::centroid::Centroid;
        self.to_geo().centroid().map(|p| [p.x(), p.y()])
    }

    fn bounding_box(&self) -> Option<(LngLat, LngLat)> {
        use geo::algorithm::bounding_rect::BoundingRect;
        self.to_geo().bounding_rect().map(|rect| {
            let (min, max) = (rect.min(), rect.max());
            ([min.x, min.y], [max.x, max.y])
        })
    }
}
