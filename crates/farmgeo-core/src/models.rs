pub mod farm;
pub mod geometry;
pub mod region;

pub use farm::{Farm, FarmCode, FarmId, NewFarm};
pub use geometry::{AreaProjection, Crs, Geometry, LngLat};
pub use region::{
    normalize_code, District, DistrictId, Farmer, FarmerId, Region, RegionId, UNKNOWN_CODE,
};
