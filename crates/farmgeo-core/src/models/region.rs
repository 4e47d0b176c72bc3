use serde::{Deserialize, Serialize};

use super::geometry::Geometry;

/// Code used for a region or district that could not be resolved
pub const UNKNOWN_CODE: &str = "UN";

/// Unique identifier for a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u64);

/// Unique identifier for a district
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistrictId(pub u64);

/// Unique identifier for a farmer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FarmerId(pub u64);

/// Top-level administrative region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    /// Short code (at most 10 characters); optional in legacy data
    pub code: Option<String>,
    /// Regions are never matched directly, only through their districts
    pub boundary: Option<Geometry>,
}

/// District owned by a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub region_id: RegionId,
    pub name: String,
    pub code: Option<String>,
    pub boundary: Option<Geometry>,
}

/// Farmer as seen by the registry: only the registered district matters here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farmer {
    pub id: FarmerId,
    pub district_id: Option<DistrictId>,
}

impl Region {
    /// Region code normalized for use inside a farm code
    pub fn farm_code_segment(&self) -> String {
        normalize_code(self.code.as_deref())
    }
}

impl District {
    /// District code normalized for use inside a farm code
    pub fn farm_code_segment(&self) -> String {
        normalize_code(self.code.as_deref())
    }
}

/// Normalize a region/district code for embedding in a farm code.
///
/// Keeps ASCII alphanumerics only (farm code segments are `-` separated) and
/// upper-cases them. Missing or empty codes become [`UNKNOWN_CODE`].
pub fn normalize_code(code: Option<&str>) -> String {
    let cleaned: String = code
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if cleaned.is_empty() {
        UNKNOWN_CODE.to_string()
    } else {
        cleaned
    }
}
