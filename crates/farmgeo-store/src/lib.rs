//! farmgeo Store - Storage ports and adapters
//!
//! This crate defines the storage ports the farm registry depends on and
//! provides in-memory and PostgreSQL/PostGIS implementations of them.

pub mod memory;
pub mod ports;
pub mod postgres;

pub use memory::{MemoryFarmStore, MemoryFarmerStore, MemoryRegionStore, MemorySequenceStore};
pub use ports::{FarmStore, FarmerStore, RegionStore, SequenceStore};
