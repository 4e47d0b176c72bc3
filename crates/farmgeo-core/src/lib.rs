//! farmgeo Core - Domain models, configuration, and ports
//!
//! This crate contains the farm registry domain types, the error taxonomy, the
//! layered configuration, and the geometry capability port implemented by `farmgeo-geo`.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{FarmgeoError, Result};
