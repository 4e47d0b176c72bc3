//! farmgeo Geo - Geometry validation, area measurement, and spatial predicates
//!
//! This crate implements the `GeometryEngine` port from `farmgeo-core` on top of
//! the `geo` and `proj4rs` crates, and provides the R-tree used to pre-filter
//! district boundaries.

pub mod area;
pub mod engine;
pub mod index;
pub mod models;
pub mod spatial;
pub mod validation;

pub use engine::GeoEngine;
