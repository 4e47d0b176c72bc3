//! Validation of user-drawn farm geometry.
//!
//! Boundaries arrive as `[lng, lat]` vertices, points as a `(lat, lng)` pair.
//! Everything leaving this module is in `[lng, lat]` order.

use crate::models::{ring_to_polygon, LngLat};
use farmgeo_core::error::{FarmgeoError, Result};
use geo::Area;

/// Rings enclosing less than this many squared degrees are treated as degenerate
const MIN_RING_AREA: f64 = 1e-12;

fn check_coordinate(field: &str, index: usize, [lng, lat]: LngLat) -> Result<()> {
    if !lng.is_finite() || !lat.is_finite() {
        return Err(FarmgeoError::invalid_geometry(
            field,
            format!("vertex {} has non-finite coordinates", index),
        ));
    }
    if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
        return Err(FarmgeoError::invalid_geometry(
            field,
            format!("vertex {} ({}, {}) is outside longitude/latitude range", index, lng, lat),
        ));
    }
    Ok(())
}

/// Validate raw vertices and return a closed ring.
///
/// Appends the first vertex when the input is not already closed, so running this
/// on its own output returns the same ring.
pub fn close_ring(field: &str, vertices: &[LngLat]) -> Result<Vec<LngLat>> {
    if vertices.len() < 3 {
        return Err(FarmgeoError::invalid_geometry(
            field,
            format!("at least 3 vertices required, got {}", vertices.len()),
        ));
    }

    for (index, vertex) in vertices.iter().enumerate() {
        check_coordinate(field, index, *vertex)?;
    }

    let mut ring = vertices.to_vec();
    if ring.first() != ring.last() {
        ring.push(ring[0]);
    }

    let mut distinct: Vec<LngLat> = Vec::with_capacity(ring.len());
    for vertex in &ring[..ring.len() - 1] {
        if !distinct.contains(vertex) {
            distinct.push(*vertex);
        }
    }
    if distinct.len() < 3 {
        return Err(FarmgeoError::invalid_geometry(
            field,
            format!("at least 3 distinct vertices required, got {}", distinct.len()),
        ));
    }

    if ring_to_polygon(&ring).unsigned_area() < MIN_RING_AREA {
        return Err(FarmgeoError::invalid_geometry(field, "polygon encloses no area"));
    }

    Ok(ring)
}

/// Validate a `(lat, lng)` pair and return it in `[lng, lat]` order
pub fn validate_point(lat: f64, lng: f64) -> Result<LngLat> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        let reason = format!("{} is not a latitude", lat);
        return Err(FarmgeoError::invalid_geometry("latitude", reason));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(FarmgeoError::invalid_geometry(
            "longitude",
            format!("{} is not a longitude", lng),
        ));
    }
    Ok([lng, lat])
}
