use farmgeo_core::config::RegistryConfig;
use farmgeo_core::error::{FarmgeoError, Result};
use farmgeo_core::models::{District, Farm, FarmId, LngLat, NewFarm, Region};
use farmgeo_core::ports::GeometryEngine;
use farmgeo_geo::GeoEngine;
use farmgeo_store::memory::{
    MemoryFarmStore, MemoryFarmerStore, MemoryRegionStore, MemorySequenceStore,
};
use farmgeo_store::ports::{FarmStore, FarmerStore, RegionStore, SequenceStore};
use geojson::FeatureCollection;

use crate::codegen::FarmCodeGenerator;
use crate::export;
use crate::matcher::RegionMatcher;
use crate::models::{RegistrationOutcome, RegistrationRequest};

const BOUNDARY_FIELD: &str = "boundary_coordinates";

/// Geometry accepted from a registration request
struct FarmGeometry {
    ring: Option<Vec<LngLat>>,
    point: Option<LngLat>,
}

/// Farm registration orchestrator
///
/// Sequences geometry validation, area measurement, region matching and code
/// allocation, then persists the farm. Also owns the two post-registration
/// operations: boundary update and boundary validation.
pub struct FarmRegistry<R, F, P, Q, G>
where
    R: RegionStore,
    F: FarmerStore,
    P: FarmStore,
    Q: SequenceStore,
    G: GeometryEngine + Clone,
{
    config: RegistryConfig,
    engine: G,
    matcher: RegionMatcher<R, F, G>,
    codes: FarmCodeGenerator<Q>,
    farms: P,
}

impl<R, F, P, Q, G> FarmRegistry<R, F, P, Q, G>
where
    R: RegionStore,
    F: FarmerStore,
    P: FarmStore,
    Q: SequenceStore,
    G: GeometryEngine + Clone,
{
    /// Create a new registry
    pub fn new(
        config: RegistryConfig,
        regions: R,
        farmers: F,
        farms: P,
        sequences: Q,
        engine: G,
    ) -> Self {
        Self {
            matcher: RegionMatcher::new(regions, farmers, engine.clone(), &config),
            codes: FarmCodeGenerator::new(sequences, &config),
            engine,
            farms,
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a new farm.
    ///
    /// Fails only when a non-empty boundary is invalid. Missing or unusable
    /// location data produces an unlocated farm with `UN` codes instead.
    pub async fn register(&self, request: RegistrationRequest) -> Result<RegistrationOutcome> {
        let geometry = self.validate_request(&request)?;

        let centroid = geometry.ring.as_deref().and_then(|ring| self.engine.centroid(ring));
        let representative = centroid.or(geometry.point);
        let location = geometry.point.or(centroid);
        let area_hectares = geometry.ring.as_deref().and_then(|ring| self.measure(ring));

        let resolution = self.matcher.resolve(representative, request.farmer_id).await;

        for attempt in 1..=self.config.max_code_attempts {
            let farm_code =
                self.codes.next_code(&resolution.region_code, &resolution.district_code).await?;

            let new_farm = NewFarm {
                farmer_id: resolution.farmer_id,
                name: request.name.clone(),
                farm_code,
                region_code: resolution.region_code.clone(),
                district_code: resolution.district_code.clone(),
                boundary: geometry.ring.clone().unwrap_or_default(),
                location,
                area_hectares,
            };

            match self.farms.insert_farm(new_farm).await {
                Ok(farm) => {
                    tracing::info!(
                        farm_id = farm.id().0,
                        farm_code = %farm.farm_code(),
                        source = ?resolution.source,
                        area_hectares = ?farm.area_hectares(),
                        "Registered farm"
                    );
                    return Ok(RegistrationOutcome { farm, resolution, code_attempts: attempt });
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt, error = %e, "Farm code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(FarmgeoError::CodeAllocationExhausted { attempts: self.config.max_code_attempts })
    }

    /// Replace a farm's boundary and recompute its area.
    ///
    /// Region, district and farm code stay as issued. The stored location is
    /// kept; a farm without one gets the new boundary's centroid.
    pub async fn update_boundary(&self, id: FarmId, vertices: &[LngLat]) -> Result<Farm> {
        let mut farm = self.get_farm(id).await?;

        let ring = self.engine.close_ring(BOUNDARY_FIELD, vertices)?;
        let area_hectares = self.measure(&ring);
        let location = farm.location().or_else(|| self.engine.centroid(&ring));

        farm.apply_boundary(ring, location, area_hectares);
        self.farms.update_farm_geometry(&farm).await?;

        tracing::info!(
            farm_id = id.0,
            farm_code = %farm.farm_code(),
            area_hectares = ?area_hectares,
            "Updated farm boundary"
        );
        Ok(farm)
    }

    /// Confirm a farm's boundary after external review
    pub async fn validate_boundary(&self, id: FarmId) -> Result<Farm> {
        let mut farm = self.get_farm(id).await?;
        self.farms.mark_validated(id).await?;
        farm.confirm_boundary();

        tracing::info!(farm_id = id.0, farm_code = %farm.farm_code(), "Validated farm boundary");
        Ok(farm)
    }

    pub async fn get_farm(&self, id: FarmId) -> Result<Farm> {
        self.farms.get_farm(id).await?.ok_or(FarmgeoError::FarmNotFound { id: id.0 })
    }

    pub async fn list_farms(&self) -> Result<Vec<Farm>> {
        self.farms.list_farms().await
    }

    /// Every registered farm as a GeoJSON layer for map clients
    pub async fn map_layer(&self) -> Result<FeatureCollection> {
        Ok(export::farm_collection(&self.farms.list_farms().await?))
    }

    /// Region boundaries with their district counts
    pub async fn region_layer(&self) -> Result<FeatureCollection> {
        let (regions, districts) = self.administrative_units().await?;
        Ok(export::region_collection(&regions, &districts))
    }

    pub async fn district_layer(&self) -> Result<FeatureCollection> {
        let (regions, districts) = self.administrative_units().await?;
        Ok(export::district_collection(&districts, &regions))
    }

    async fn administrative_units(&self) -> Result<(Vec<Region>, Vec<District>)> {
        let store = self.matcher.regions();
        tokio::try_join!(store.list_regions(), store.list_districts())
    }

    fn validate_request(&self, request: &RegistrationRequest) -> Result<FarmGeometry> {
        let ring = match request.boundary_coordinates.as_deref() {
            Some(vertices) if !vertices.is_empty() => {
                Some(self.engine.close_ring(BOUNDARY_FIELD, vertices)?)
            }
            _ => None,
        };

        let point = match (request.latitude, request.longitude) {
            (Some(lat), Some(lng)) => match self.engine.validate_point(lat, lng) {
                Ok(point) => Some(point),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring invalid farm location");
                    None
                }
            },
            (None, None) => None,
            _ => {
                tracing::warn!("Ignoring farm location with only one of latitude/longitude");
                None
            }
        };

        Ok(FarmGeometry { ring, point })
    }

    /// Area in hectares; failures are logged and leave the area unset
    fn measure(&self, ring: &[LngLat]) -> Option<f64> {
        match self.engine.area_hectares(ring, self.config.area_projection) {
            Ok(hectares) => Some(hectares),
            Err(e) => {
                tracing::warn!(error = %e, "Farm area left unset");
                None
            }
        }
    }
}

/// Registry backed entirely by the in-memory stores
pub type MemoryRegistry = FarmRegistry<
    MemoryRegionStore,
    MemoryFarmerStore,
    MemoryFarmStore,
    MemorySequenceStore,
    GeoEngine,
>;

impl MemoryRegistry {
    /// Registry with empty in-memory stores, for development and tests
    pub fn in_memory(config: RegistryConfig) -> Self {
        FarmRegistry::new(
            config,
            MemoryRegionStore::new(),
            MemoryFarmerStore::new(),
            MemoryFarmStore::new(),
            MemorySequenceStore::new(),
            GeoEngine::new(),
        )
    }
}
