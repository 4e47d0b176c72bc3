use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::geometry::{Geometry, LngLat};
use super::region::FarmerId;

/// Unique identifier for a farm
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FarmId(pub u64);

/// Human-readable farm code: `<PREFIX>-<REGION>-<DISTRICT>-<NNNNNN>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FarmCode {
    prefix: String,
    region: String,
    district: String,
    sequence: u64,
}

impl FarmCode {
    /// Number of digits the sequence is zero-padded to
    pub const SEQUENCE_WIDTH: usize = 6;

    pub fn new(
        prefix: impl Into<String>,
        region: impl Into<String>,
        district: impl Into<String>,
        sequence: u64,
    ) -> Self {
        Self { prefix: prefix.into(), region: region.into(), district: district.into(), sequence }
    }

    /// Parse a code previously produced by [`FarmCode`]'s `Display`
    pub fn parse(code: &str) -> Option<Self> {
        let parts: Vec<&str> = code.split('-').collect();
        let [prefix, region, district, sequence] = parts.as_slice() else {
            return None;
        };

        if prefix.is_empty() || region.is_empty() || district.is_empty() {
            return None;
        }
        if sequence.len() < Self::SEQUENCE_WIDTH || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self::new(*prefix, *region, *district, sequence.parse().ok()?))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn district(&self) -> &str {
        &self.district
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for FarmCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{:0width$}",
            self.prefix,
            self.region,
            self.district,
            self.sequence,
            width = Self::SEQUENCE_WIDTH
        )
    }
}

impl From<FarmCode> for String {
    fn from(code: FarmCode) -> Self {
        code.to_string()
    }
}

impl TryFrom<String> for FarmCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FarmCode::parse(&value).ok_or_else(|| format!("malformed farm code: {}", value))
    }
}

/// A farm about to be persisted; the store assigns its id
#[derive(Debug, Clone, PartialEq)]
pub struct NewFarm {
    pub farmer_id: Option<FarmerId>,
    pub name: Option<String>,
    pub farm_code: FarmCode,
    pub region_code: String,
    pub district_code: String,
    /// Closed exterior ring, empty when the farm has no boundary
    pub boundary: Vec<LngLat>,
    pub location: Option<LngLat>,
    pub area_hectares: Option<f64>,
}

/// Registered farm.
///
/// `farm_code`, `region_code` and `district_code` are fixed when the farm is
/// constructed and have no setters; geometry can change through
/// [`Farm::apply_boundary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    id: FarmId,
    farmer_id: Option<FarmerId>,
    pub name: Option<String>,
    farm_code: FarmCode,
    region_code: String,
    district_code: String,
    boundary: Vec<LngLat>,
    location: Option<LngLat>,
    area_hectares: Option<f64>,
    has_boundary_polygon: bool,
    validation_status: bool,
    registered_at: DateTime<Utc>,
}

impl Farm {
    /// Materialize a persisted farm from its draft
    pub fn from_new(id: FarmId, new: NewFarm, registered_at: DateTime<Utc>) -> Self {
        let has_boundary_polygon = !new.boundary.is_empty();
        Self {
            id,
            farmer_id: new.farmer_id,
            name: new.name,
            farm_code: new.farm_code,
            region_code: new.region_code,
            district_code: new.district_code,
            boundary: new.boundary,
            location: new.location,
            area_hectares: new.area_hectares,
            has_boundary_polygon,
            validation_status: false,
            registered_at,
        }
    }

    pub fn id(&self) -> FarmId {
        self.id
    }

    pub fn farmer_id(&self) -> Option<FarmerId> {
        self.farmer_id
    }

    pub fn farm_code(&self) -> &FarmCode {
        &self.farm_code
    }

    pub fn region_code(&self) -> &str {
        &self.region_code
    }

    pub fn district_code(&self) -> &str {
        &self.district_code
    }

    pub fn boundary(&self) -> &[LngLat] {
        &self.boundary
    }

    pub fn location(&self) -> Option<LngLat> {
        self.location
    }

    pub fn area_hectares(&self) -> Option<f64> {
        self.area_hectares
    }

    pub fn has_boundary_polygon(&self) -> bool {
        self.has_boundary_polygon
    }

    pub fn validation_status(&self) -> bool {
        self.validation_status
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Display name, defaulting to `Farm <code>`
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("Farm {}", self.farm_code))
    }

    /// Boundary as a GeoJSON Polygon
    pub fn boundary_geometry(&self) -> Option<Geometry> {
        if self.boundary.is_empty() {
            None
        } else {
            Some(Geometry::from_ring(self.boundary.clone()))
        }
    }

    /// Location as a GeoJSON Point
    pub fn location_geometry(&self) -> Option<Geometry> {
        self.location.map(|[lng, lat]| Geometry::point(lng, lat))
    }

    /// Replace the boundary with an already validated, closed ring
    pub fn apply_boundary(
        &mut self,
        ring: Vec<LngLat>,
        location: Option<LngLat>,
        area_hectares: Option<f64>,
    ) {
        self.has_boundary_polygon = !ring.is_empty();
        self.boundary = ring;
        self.location = location;
        self.area_hectares = area_hectares;
    }

    /// Mark the boundary as confirmed by a reviewer
    pub fn confirm_boundary(&mut self) {
        self.validation_status = true;
    }
}
