//! Canonical geometry types shared by every farmgeo crate.
//!
//! Coordinates are always `[longitude, latitude]` in WGS 84 (EPSG:4326). The
//! [`Geometry`] enum serializes as a GeoJSON geometry object, which is what map
//! clients consume.

use serde::{Deserialize, Serialize};

/// A `[longitude, latitude]` pair
pub type LngLat = [f64; 2];

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 / UTM zone for a longitude/latitude (EPSG:326zz north, 327zz south)
    pub fn utm_for(lng: f64, lat: f64) -> Self {
        let zone = utm_zone(lng);
        if lat >= 0.0 {
            Self::new(32600 + zone, format!("WGS 84 / UTM zone {}N", zone))
        } else {
            Self::new(32700 + zone, format!("WGS 84 / UTM zone {}S", zone))
        }
    }
}

/// UTM zone number (1..=60) containing a longitude
pub fn utm_zone(lng: f64) -> u32 {
    (((lng + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u32
}

/// Planar projection used to measure farm areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AreaProjection {
    /// UTM zone containing the polygon centroid
    #[default]
    LocalUtm,
    /// Global Web Mercator; overstates area away from the equator
    WebMercator,
}

/// GeoJSON-compatible geometry representation
///
/// Farms only ever carry `Point` and `Polygon`; district and region boundaries
/// may also be `MultiPolygon` (islands, exclaves).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: LngLat,
    },
    Polygon {
        coordinates: Vec<Vec<LngLat>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<LngLat>>>,
    },
}

impl Geometry {
    /// Create a Point geometry
    pub fn point(lng: f64, lat: f64) -> Self {
        Geometry::Point { coordinates: [lng, lat] }
    }

    /// Create a Polygon geometry
    pub fn polygon(rings: Vec<Vec<LngLat>>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    /// Create a Polygon with a single exterior ring
    pub fn from_ring(ring: Vec<LngLat>) -> Self {
        Geometry::Polygon { coordinates: vec![ring] }
    }

    /// Create a MultiPolygon geometry
    pub fn multi_polygon(polygons: Vec<Vec<Vec<LngLat>>>) -> Self {
        Geometry::MultiPolygon { coordinates: polygons }
    }

    /// Exterior ring of a Polygon, or None for other types
    pub fn exterior(&self) -> Option<&[LngLat]> {
        match self {
            Geometry::Polygon { coordinates } => coordinates.first().map(|r| r.as_slice()),
            _ => None,
        }
    }

    /// Try to parse from a serde_json::Value (GeoJSON)
    pub fn from_geojson(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Convert to serde_json::Value (GeoJSON)
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
