//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod geometry;

pub use geometry::GeometryEngine;
