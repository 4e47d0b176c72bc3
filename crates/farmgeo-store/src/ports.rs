use async_trait::async_trait;
use farmgeo_core::error::Result;
use farmgeo_core::models::{
    District, DistrictId, Farm, FarmId, Farmer, FarmerId, Geometry, LngLat, NewFarm, Region,
    RegionId,
};

/// Longest region or district code the stores accept
pub const MAX_CODE_LEN: usize = 10;

/// Port for administrative boundaries (regions and their districts)
///
/// Districts are returned in storage order, which is insertion order.
#[async_trait]
pub trait RegionStore: Send + Sync {
    /// Store a region.
    ///
    /// Region codes are unique and at most [`MAX_CODE_LEN`] characters.
    async fn insert_region(
        &self,
        name: &str,
        code: Option<&str>,
        boundary: Option<Geometry>,
    ) -> Result<Region>;

    /// Store a district owned by `region_id`; codes are at most [`MAX_CODE_LEN`] characters
    async fn insert_district(
        &self,
        region_id: RegionId,
        name: &str,
        code: Option<&str>,
        boundary: Option<Geometry>,
    ) -> Result<District>;

    async fn get_region(&self, id: RegionId) -> Result<Option<Region>>;

    async fn get_district(&self, id: DistrictId) -> Result<Option<District>>;

    async fn list_regions(&self) -> Result<Vec<Region>>;

    async fn list_districts(&self) -> Result<Vec<District>>;

    /// Districts whose boundary contains the point or has it on an edge
    async fn districts_covering(&self, point: LngLat) -> Result<Vec<District>>;

    /// Districts whose boundary intersects a disc of `radius` degrees around the point
    async fn districts_near(&self, point: LngLat, radius: f64) -> Result<Vec<District>>;
}

/// Port for the farmer lookup used as the last-resort region fallback
#[async_trait]
pub trait FarmerStore: Send + Sync {
    /// Store a farmer registered in `district_id`
    async fn insert_farmer(&self, district_id: Option<DistrictId>) -> Result<Farmer>;

    async fn get_farmer(&self, id: FarmerId) -> Result<Option<Farmer>>;
}

/// Port for farm records
#[async_trait]
pub trait FarmStore: Send + Sync {
    /// Persist a new farm.
    ///
    /// Fails with `DuplicateFarmCode` when the code is already taken; nothing is
    /// stored in that case.
    async fn insert_farm(&self, farm: NewFarm) -> Result<Farm>;

    async fn get_farm(&self, id: FarmId) -> Result<Option<Farm>>;

    /// All farms ordered by id
    async fn list_farms(&self) -> Result<Vec<Farm>>;

    /// Write back boundary, location, area and the boundary flag of a farm
    async fn update_farm_geometry(&self, farm: &Farm) -> Result<()>;

    /// Set the farm's validation status to confirmed, leaving geometry untouched
    async fn mark_validated(&self, id: FarmId) -> Result<()>;
}

/// Port for durable farm-code sequence counters
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Atomically increment the counter for `scope` and return the new value.
    ///
    /// The first value of a scope is 1. A value is never handed out twice.
    async fn next_value(&self, scope: &str) -> Result<u64>;
}
