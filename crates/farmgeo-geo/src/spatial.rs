use crate::models::{to_geo_geometry, Geometry, LngLat};
use geo::algorithm::area::Area;
use geo::algorithm::intersects::Intersects;
use geo::{Coord, Geometry as GeoGeometry, LineString, Point, Polygon};

/// Vertices used to approximate a buffer disc
const DISC_SEGMENTS: usize = 32;

/// Check if the point lies in the interior or on the boundary of a geometry.
///
/// Points on an edge count as inside, matching PostGIS `ST_Covers`.
pub fn covers(boundary: &Geometry, point: LngLat) -> bool {
    let point = Point::new(point[0], point[1]);
    match to_geo_geometry(boundary) {
        GeoGeometry::Polygon(polygon) => polygon.intersects(&point),
        GeoGeometry::MultiPolygon(multi) => multi.intersects(&point),
        GeoGeometry::Point(p) => p == point,
        _ => false,
    }
}

/// Polygon approximating a disc of `radius` degrees around `center`
pub fn disc(center: LngLat, radius: f64) -> Polygon {
    let coords: Vec<Coord> = (0..DISC_SEGMENTS)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / DISC_SEGMENTS as f64;
            Coord { x: center[0] + radius * theta.cos(), y: center[1] + radius * theta.sin() }
        })
        .collect();
    Polygon::new(LineString::new(coords), vec![])
}

/// Check if a buffered point touches a geometry
pub fn intersects_disc(boundary: &Geometry, center: LngLat, radius: f64) -> bool {
    if radius <= 0.0 {
        return covers(boundary, center);
    }

    let buffer = disc(center, radius);
    match to_geo_geometry(boundary) {
        GeoGeometry::Polygon(polygon) => polygon.intersects(&buffer),
        GeoGeometry::MultiPolygon(multi) => multi.intersects(&buffer),
        GeoGeometry::Point(p) => buffer.intersects(&p),
        _ => false,
    }
}

/// Planar area in squared degrees; zero for points
pub fn planar_area(boundary: &Geometry) -> f64 {
    match boundary {
        Geometry::Point { .. } => 0.0,
        _ => to_geo_geometry(boundary).unsigned_area(),
    }
}
