//! farmgeo Registry - Farm registration and boundary maintenance
//!
//! Turns raw farm geometry into a registered farm: validates the boundary,
//! measures it, resolves the administrative district it lies in, and mints a
//! unique farm code.

pub mod codegen;
pub mod export;
pub mod matcher;
pub mod models;
pub mod registration;

pub use codegen::FarmCodeGenerator;
pub use matcher::RegionMatcher;
pub use models::{RegionResolution, RegistrationOutcome, RegistrationRequest, ResolutionSource};
pub use registration::{FarmRegistry, MemoryRegistry};
