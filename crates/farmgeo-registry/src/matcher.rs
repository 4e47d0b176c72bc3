//! Spatial region matching.
//!
//! Tiers run in order and the first one that yields a district wins:
//! containment, buffered proximity, the farmer's registered district, and
//! finally the `UN` sentinel. Every store lookup is bounded by the configured
//! timeout; a timed out or failed lookup counts as "no match" for its tier.

use farmgeo_core::config::{OverlapPolicy, RegistryConfig};
use farmgeo_core::error::{FarmgeoError, Result};
use farmgeo_core::models::{normalize_code, District, Farmer, FarmerId, LngLat};
use farmgeo_core::ports::GeometryEngine;
use farmgeo_store::ports::{FarmerStore, RegionStore};
use std::future::Future;
use std::time::Duration;

use crate::models::{RegionResolution, ResolutionSource};

/// Resolves the district and region a farm belongs to
pub struct RegionMatcher<R, F, G>
where
    R: RegionStore,
    F: FarmerStore,
    G: GeometryEngine,
{
    regions: R,
    farmers: F,
    engine: G,
    overlap_policy: OverlapPolicy,
    buffer_radius: f64,
    lookup_timeout: Duration,
}

impl<R, F, G> RegionMatcher<R, F, G>
where
    R: RegionStore,
    F: FarmerStore,
    G: GeometryEngine,
{
    pub fn new(regions: R, farmers: F, engine: G, config: &RegistryConfig) -> Self {
        Self {
            regions,
            farmers,
            engine,
            overlap_policy: config.overlap_policy,
            buffer_radius: config.buffer_radius_degrees,
            lookup_timeout: config.lookup_timeout,
        }
    }

    pub(crate) fn regions(&self) -> &R {
        &self.regions
    }

    /// Resolve region/district codes for a representative point.
    ///
    /// Never fails; the worst case is [`RegionResolution::unresolved`]. The
    /// farmer is looked up once up front, and only a farmer the store knows is
    /// reported back in [`RegionResolution::farmer_id`].
    pub async fn resolve(
        &self,
        point: Option<LngLat>,
        farmer_id: Option<FarmerId>,
    ) -> RegionResolution {
        let farmer = match farmer_id {
            Some(id) => self.known_farmer(id).await,
            None => None,
        };
        let verified_farmer = farmer.as_ref().map(|f| f.id);

        let resolution = match point {
            Some(point) => self.spatial_match(point).await,
            None => None,
        };
        if let (None, Some(point)) = (&resolution, point) {
            let degraded = FarmgeoError::RegionResolutionDegraded {
                reason: format!(
                    "no district contains or lies within {} degrees of ({}, {})",
                    self.buffer_radius, point[0], point[1]
                ),
            };
            tracing::warn!(error = %degraded, "Spatial region lookup failed");
        }

        let resolution = match (resolution, farmer) {
            (Some(resolution), _) => Some(resolution),
            (None, Some(farmer)) => self.farmer_fallback(farmer).await,
            (None, None) => None,
        };

        let resolution = resolution.unwrap_or_else(|| {
            tracing::debug!("Region unresolved, using sentinel codes");
            RegionResolution::unresolved()
        });
        RegionResolution { farmer_id: verified_farmer, ..resolution }
    }

    async fn known_farmer(&self, farmer_id: FarmerId) -> Option<Farmer> {
        let farmer = self.bounded("farmer lookup", self.farmers.get_farmer(farmer_id)).await?;
        if farmer.is_none() {
            tracing::warn!(farmer_id = farmer_id.0, "Unknown farmer, farm stays unassigned");
        }
        farmer
    }

    async fn spatial_match(&self, point: LngLat) -> Option<RegionResolution> {
        let containing = self
            .bounded("containment", self.regions.districts_covering(point))
            .await
            .unwrap_or_default();

        if let Some(district) = self.pick_containing(containing) {
            tracing::debug!(district = %district.name, "Resolved district by containment");
            return self.resolution_for(district, ResolutionSource::Containment).await;
        }

        if self.buffer_radius <= 0.0 {
            return None;
        }

        let nearby = self
            .bounded(
                "buffered proximity",
                self.regions.districts_near(point, self.buffer_radius),
            )
            .await
            .unwrap_or_default();

        let district = nearby.into_iter().next()?;
        tracing::debug!(district = %district.name, "Resolved district by buffered proximity");
        self.resolution_for(district, ResolutionSource::BufferedProximity).await
    }

    async fn farmer_fallback(&self, farmer: Farmer) -> Option<RegionResolution> {
        let district_id = farmer.district_id?;
        let district = self
            .bounded("farmer district lookup", self.regions.get_district(district_id))
            .await??;

        tracing::debug!(
            farmer_id = farmer.id.0,
            district = %district.name,
            "Resolved district from farmer"
        );
        self.resolution_for(district, ResolutionSource::FarmerFallback).await
    }

    /// Apply the overlap policy to districts containing the point
    fn pick_containing(&self, districts: Vec<District>) -> Option<District> {
        if districts.len() > 1 {
            tracing::debug!(
                candidates = districts.len(),
                policy = ?self.overlap_policy,
                "Point lies in overlapping districts"
            );
        }

        let area = |district: &District| {
            district.boundary.as_ref().map_or(f64::INFINITY, |g| self.engine.planar_area(g))
        };

        match self.overlap_policy {
            OverlapPolicy::StorageOrder => districts.into_iter().next(),
            OverlapPolicy::SmallestArea => {
                districts.into_iter().min_by(|a, b| area(a).total_cmp(&area(b)))
            }
        }
    }

    /// Codes for a matched district.
    ///
    /// A failed region lookup makes the whole tier a miss, so a real district
    /// code is never paired with the sentinel region code.
    async fn resolution_for(
        &self,
        district: District,
        source: ResolutionSource,
    ) -> Option<RegionResolution> {
        let region =
            self.bounded("region lookup", self.regions.get_region(district.region_id)).await?;

        Some(RegionResolution {
            region_code: normalize_code(region.as_ref().and_then(|r| r.code.as_deref())),
            district_code: district.farm_code_segment(),
            district_id: Some(district.id),
            farmer_id: None,
            source,
        })
    }

    /// Run one store lookup under the timeout, degrading failures to `None`
    async fn bounded<T>(&self, tier: &str, lookup: impl Future<Output = Result<T>>) -> Option<T> {
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::warn!(tier, error = %e, "Region lookup failed");
                None
            }
            Err(_) => {
                let timeout_ms = self.lookup_timeout.as_millis() as u64;
                tracing::warn!(tier, timeout_ms, "Region lookup timed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmgeo_core::models::Geometry;
    use farmgeo_geo::GeoEngine;
    use farmgeo_store::memory::{MemoryFarmerStore, MemoryRegionStore};

    fn square(min_x: f64, min_y: f64, size: f64) -> Geometry {
        Geometry::from_ring(vec![
            [min_x, min_y],
            [min_x + size, min_y],
            [min_x + size, min_y + size],
            [min_x, min_y + size],
            [min_x, min_y],
        ])
    }

    fn matcher(
        regions: &MemoryRegionStore,
        farmers: &MemoryFarmerStore,
        config: &RegistryConfig,
    ) -> RegionMatcher<MemoryRegionStore, MemoryFarmerStore, GeoEngine> {
        RegionMatcher::new(regions.clone(), farmers.clone(), GeoEngine::new(), config)
    }

    #[tokio::test]
    async fn test_overlap_prefers_smallest_district() {
        let regions = MemoryRegionStore::new();
        let region = regions.insert_region("Rift", Some("RR"), None).await.unwrap();
        regions
            .insert_district(region.id, "Big", Some("BG"), Some(square(0.0, 0.0, 4.0)))
            .await
            .unwrap();
        regions
            .insert_district(region.id, "Small", Some("SM"), Some(square(1.0, 1.0, 1.0)))
            .await
            .unwrap();

        let config = RegistryConfig::default();
        let resolution = matcher(&regions, &MemoryFarmerStore::new(), &config)
            .resolve(Some([1.5, 1.5]), None)
            .await;
        assert_eq!(resolution.district_code, "SM");
        assert_eq!(resolution.source, ResolutionSource::Containment);
    }

    #[tokio::test]
    async fn test_overlap_storage_order() {
        let regions = MemoryRegionStore::new();
        let region = regions.insert_region("Rift", Some("RR"), None).await.unwrap();
        regions
            .insert_district(region.id, "Big", Some("BG"), Some(square(0.0, 0.0, 4.0)))
            .await
            .unwrap();
        regions
            .insert_district(region.id, "Small", Some("SM"), Some(square(1.0, 1.0, 1.0)))
            .await
            .unwrap();

        let config =
            RegistryConfig { overlap_policy: OverlapPolicy::StorageOrder, ..Default::default() };
        let resolution = matcher(&regions, &MemoryFarmerStore::new(), &config)
            .resolve(Some([1.5, 1.5]), None)
            .await;
        assert_eq!(resolution.district_code, "BG");
    }

    #[tokio::test]
    async fn test_region_without_code_uses_sentinel() {
        let regions = MemoryRegionStore::new();
        let region = regions.insert_region("Uncoded", None, None).await.unwrap();
        regions
            .insert_district(region.id, "Coded", Some("cd"), Some(square(0.0, 0.0, 1.0)))
            .await
            .unwrap();

        let config = RegistryConfig::default();
        let resolution = matcher(&regions, &MemoryFarmerStore::new(), &config)
            .resolve(Some([0.5, 0.5]), None)
            .await;
        assert_eq!(resolution.region_code, "UN");
        assert_eq!(resolution.district_code, "CD");
    }

    #[tokio::test]
    async fn test_zero_radius_skips_buffer_tier() {
        let regions = MemoryRegionStore::new();
        let region = regions.insert_region("Rift", Some("RR"), None).await.unwrap();
        regions
            .insert_district(region.id, "Edge", Some("ED"), Some(square(0.0, 0.0, 1.0)))
            .await
            .unwrap();

        let config = RegistryConfig { buffer_radius_degrees: 0.0, ..Default::default() };
        let resolution = matcher(&regions, &MemoryFarmerStore::new(), &config)
            .resolve(Some([1.005, 0.5]), None)
            .await;
        assert_eq!(resolution, RegionResolution::unresolved());
    }

    #[tokio::test]
    async fn test_farmer_fallback_without_point() {
        let regions = MemoryRegionStore::new();
        let farmers = MemoryFarmerStore::new();
        let region = regions.insert_region("Coast", Some("CO"), None).await.unwrap();
        let district = regions
            .insert_district(region.id, "Kilifi", Some("KF"), None)
            .await
            .unwrap();
        let farmer = farmers.insert_farmer(Some(district.id)).await.unwrap();

        let config = RegistryConfig::default();
        let resolution = matcher(&regions, &farmers, &config).resolve(None, Some(farmer.id)).await;
        assert_eq!(resolution.region_code, "CO");
        assert_eq!(resolution.district_code, "KF");
        assert_eq!(resolution.district_id, Some(district.id));
        assert_eq!(resolution.source, ResolutionSource::FarmerFallback);
    }

    #[tokio::test]
    async fn test_unknown_farmer_is_unresolved() {
        let config = RegistryConfig::default();
        let resolution = matcher(&MemoryRegionStore::new(), &MemoryFarmerStore::new(), &config)
            .resolve(Some([3.0, 3.0]), Some(FarmerId(77)))
            .await;
        assert_eq!(resolution, RegionResolution::unresolved());
    }

    #[tokio::test]
    async fn test_known_farmer_reported_with_spatial_match() {
        let regions = MemoryRegionStore::new();
        let farmers = MemoryFarmerStore::new();
        let region = regions.insert_region("Rift", Some("RR"), None).await.unwrap();
        regions
            .insert_district(region.id, "Alpha", Some("AA"), Some(square(0.0, 0.0, 1.0)))
            .await
            .unwrap();
        let farmer = farmers.insert_farmer(None).await.unwrap();
        let config = RegistryConfig::default();
        let matcher = matcher(&regions, &farmers, &config);

        let known = matcher.resolve(Some([0.5, 0.5]), Some(farmer.id)).await;
        assert_eq!(known.source, ResolutionSource::Containment);
        assert_eq!(known.farmer_id, Some(farmer.id));

        let unknown = matcher.resolve(Some([0.5, 0.5]), Some(FarmerId(77))).await;
        assert_eq!(unknown.source, ResolutionSource::Containment);
        assert_eq!(unknown.district_code, "AA");
        assert_eq!(unknown.farmer_id, None);
    }
}
