use farmgeo_core::models::{DistrictId, Farm, FarmerId, LngLat, UNKNOWN_CODE};
use serde::{Deserialize, Serialize};

/// Raw farm registration input as submitted by the intake layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Farmer whose registered district is the last-resort region fallback
    pub farmer_id: Option<FarmerId>,
    pub name: Option<String>,
    /// Drawn boundary as `[lng, lat]` vertices; closed automatically
    pub boundary_coordinates: Option<Vec<LngLat>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RegistrationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_farmer(mut self, farmer_id: FarmerId) -> Self {
        self.farmer_id = Some(farmer_id);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_boundary(mut self, vertices: Vec<LngLat>) -> Self {
        self.boundary_coordinates = Some(vertices);
        self
    }

    /// Set the location from a `(lat, lng)` pair
    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

/// Which strategy resolved a farm's district
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionSource {
    /// A district boundary contains the representative point
    Containment,
    /// A district boundary lies within the buffer radius of the point
    BufferedProximity,
    /// The farmer's registered district
    FarmerFallback,
    /// Nothing matched; codes are the `UN` sentinel
    Unresolved,
}

/// Region and district codes resolved for a farm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResolution {
    pub region_code: String,
    pub district_code: String,
    pub district_id: Option<DistrictId>,
    /// Requested farmer, present only when the farmer store knows it
    pub farmer_id: Option<FarmerId>,
    pub source: ResolutionSource,
}

impl RegionResolution {
    pub fn unresolved() -> Self {
        Self {
            region_code: UNKNOWN_CODE.to_string(),
            district_code: UNKNOWN_CODE.to_string(),
            district_id: None,
            farmer_id: None,
            source: ResolutionSource::Unresolved,
        }
    }
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationOutcome {
    pub farm: Farm,
    pub resolution: RegionResolution,
    /// Farm codes tried before one was accepted by the store
    pub code_attempts: u32,
}
