//! In-memory storage implementations for development and testing.
//!
//! These implementations use `RwLock::unwrap()` and `Mutex::unwrap()`
//! intentionally. Lock poisoning only occurs when another thread panicked while
//! holding the lock, which is an unrecoverable state. For production workloads,
//! use the PostgreSQL backend.

use async_trait::async_trait;
use chrono::Utc;
use farmgeo_core::error::{FarmgeoError, Result};
use farmgeo_core::models::{
    District, DistrictId, Farm, FarmId, Farmer, FarmerId, Geometry, LngLat, NewFarm, Region,
    RegionId,
};
use farmgeo_core::ports::GeometryEngine;
use farmgeo_geo::index::BoundaryIndex;
use farmgeo_geo::GeoEngine;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use crate::ports::{FarmStore, FarmerStore, RegionStore, SequenceStore, MAX_CODE_LEN};

#[derive(Debug, Default)]
struct BoundaryTables {
    regions: Vec<Region>,
    /// Storage order; positions double as R-tree ids
    districts: Vec<District>,
    index: BoundaryIndex,
}

/// Same limit as the `VARCHAR(10)` code columns in PostgreSQL
fn check_code_len(code: &str) -> Result<()> {
    if code.chars().count() > MAX_CODE_LEN {
        return Err(FarmgeoError::Storage(format!(
            "Code {} is longer than {} characters",
            code, MAX_CODE_LEN
        )));
    }
    Ok(())
}

/// In-memory implementation of RegionStore
///
/// District lookups pre-filter with an R-tree over boundary envelopes, then run
/// the exact predicate through the geometry engine.
#[derive(Debug, Clone)]
pub struct MemoryRegionStore<G = GeoEngine> {
    engine: G,
    tables: Arc<RwLock<BoundaryTables>>,
}

impl MemoryRegionStore<GeoEngine> {
    /// Create a new in-memory region store
    pub fn new() -> Self {
        Self::with_engine(GeoEngine::new())
    }
}

impl Default for MemoryRegionStore<GeoEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GeometryEngine> MemoryRegionStore<G> {
    /// Create a store that evaluates predicates with `engine`
    pub fn with_engine(engine: G) -> Self {
        Self { engine, tables: Arc::new(RwLock::new(BoundaryTables::default())) }
    }

    fn matching_districts(
        &self,
        point: LngLat,
        radius: f64,
        predicate: impl Fn(&Geometry) -> bool,
    ) -> Vec<District> {
        let tables = self.tables.read().unwrap();
        tables
            .index
            .candidates(point, radius)
            .into_iter()
            .filter_map(|position| tables.districts.get(position))
            .filter(|district| district.boundary.as_ref().is_some_and(&predicate))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl<G: GeometryEngine> RegionStore for MemoryRegionStore<G> {
    async fn insert_region(
        &self,
        name: &str,
        code: Option<&str>,
        boundary: Option<Geometry>,
    ) -> Result<Region> {
        let mut tables = self.tables.write().unwrap();
        if let Some(code) = code {
            check_code_len(code)?;
            if tables.regions.iter().any(|r| r.code.as_deref() == Some(code)) {
                return Err(FarmgeoError::Storage(format!("Region code {} already exists", code)));
            }
        }

        let region = Region {
            id: RegionId(tables.regions.len() as u64 + 1),
            name: name.to_string(),
            code: code.map(str::to_string),
            boundary,
        };
        tables.regions.push(region.clone());
        Ok(region)
    }

    async fn insert_district(
        &self,
        region_id: RegionId,
        name: &str,
        code: Option<&str>,
        boundary: Option<Geometry>,
    ) -> Result<District> {
        let mut tables = self.tables.write().unwrap();
        if !tables.regions.iter().any(|r| r.id == region_id) {
            return Err(FarmgeoError::Storage(format!("Region {} does not exist", region_id.0)));
        }
        if let Some(code) = code {
            check_code_len(code)?;
        }

        let position = tables.districts.len();
        let district = District {
            id: DistrictId(position as u64 + 1),
            region_id,
            name: name.to_string(),
            code: code.map(str::to_string),
            boundary,
        };

        if let Some(boundary) = &district.boundary {
            tables.index.insert(position, boundary);
        }
        tables.districts.push(district.clone());
        Ok(district)
    }

    async fn get_region(&self, id: RegionId) -> Result<Option<Region>> {
        let tables = self.tables.read().unwrap();
        Ok(tables.regions.iter().find(|r| r.id == id).cloned())
    }

    async fn get_district(&self, id: DistrictId) -> Result<Option<District>> {
        let tables = self.tables.read().unwrap();
        Ok(tables.districts.iter().find(|d| d.id == id).cloned())
    }

    async fn list_regions(&self) -> Result<Vec<Region>> {
        Ok(self.tables.read().unwrap().regions.clone())
    }

    async fn list_districts(&self) -> Result<Vec<District>> {
        Ok(self.tables.read().unwrap().districts.clone())
    }

    async fn districts_covering(&self, point: LngLat) -> Result<Vec<District>> {
        Ok(self.matching_districts(point, 0.0, |boundary| self.engine.covers(boundary, point)))
    }

    async fn districts_near(&self, point: LngLat, radius: f64) -> Result<Vec<District>> {
        Ok(self.matching_districts(point, radius, |boundary| {
            self.engine.intersects_disc(boundary, point, radius)
        }))
    }
}

/// In-memory implementation of FarmerStore
#[derive(Debug, Clone, Default)]
pub struct MemoryFarmerStore {
    farmers: Arc<RwLock<Vec<Farmer>>>,
}

impl MemoryFarmerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FarmerStore for MemoryFarmerStore {
    async fn insert_farmer(&self, district_id: Option<DistrictId>) -> Result<Farmer> {
        let mut farmers = self.farmers.write().unwrap();
        let farmer = Farmer { id: FarmerId(farmers.len() as u64 + 1), district_id };
        farmers.push(farmer.clone());
        Ok(farmer)
    }

    async fn get_farmer(&self, id: FarmerId) -> Result<Option<Farmer>> {
        let farmers = self.farmers.read().unwrap();
        Ok(farmers.iter().find(|f| f.id == id).cloned())
    }
}

#[derive(Debug, Default)]
struct FarmTable {
    farms: BTreeMap<FarmId, Farm>,
    codes: HashSet<String>,
    next_id: u64,
}

/// In-memory implementation of FarmStore
///
/// Farm codes are unique across the table, like the unique index in PostgreSQL.
#[derive(Debug, Clone, Default)]
pub struct MemoryFarmStore {
    table: Arc<RwLock<FarmTable>>,
}

impl MemoryFarmStore {
    /// Create a new in-memory farm store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored farms
    pub fn len(&self) -> usize {
        self.table.read().unwrap().farms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FarmStore for MemoryFarmStore {
    async fn insert_farm(&self, farm: NewFarm) -> Result<Farm> {
        let mut table = self.table.write().unwrap();

        let code = farm.farm_code.to_string();
        if table.codes.contains(&code) {
            return Err(FarmgeoError::DuplicateFarmCode { code });
        }

        table.next_id += 1;
        let stored = Farm::from_new(FarmId(table.next_id), farm, Utc::now());
        table.codes.insert(code);
        table.farms.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn get_farm(&self, id: FarmId) -> Result<Option<Farm>> {
        let table = self.table.read().unwrap();
        Ok(table.farms.get(&id).cloned())
    }

    async fn list_farms(&self) -> Result<Vec<Farm>> {
        let table = self.table.read().unwrap();
        Ok(table.farms.values().cloned().collect())
    }

    async fn update_farm_geometry(&self, farm: &Farm) -> Result<()> {
        let mut table = self.table.write().unwrap();
        let stored =
            table.farms.get_mut(&farm.id()).ok_or(FarmgeoError::FarmNotFound { id: farm.id().0 })?;
        stored.apply_boundary(farm.boundary().to_vec(), farm.location(), farm.area_hectares());
        Ok(())
    }

    async fn mark_validated(&self, id: FarmId) -> Result<()> {
        let mut table = self.table.write().unwrap();
        let stored = table.farms.get_mut(&id).ok_or(FarmgeoError::FarmNotFound { id: id.0 })?;
        stored.confirm_boundary();
        Ok(())
    }
}

/// In-memory implementation of SequenceStore
#[derive(Debug, Clone, Default)]
pub struct MemorySequenceStore {
    counters: Arc<Mutex<HashMap<String, u64>>>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SequenceStore for MemorySequenceStore {
    async fn next_value(&self, scope: &str) -> Result<u64> {
        let mut counters = self.counters.lock().unwrap();
        let counter = counters.entry(scope.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmgeo_core::models::FarmCode;

    fn square(min_x: f64, min_y: f64, size: f64) -> Geometry {
        Geometry::from_ring(vec![
            [min_x, min_y],
            [min_x + size, min_y],
            [min_x + size, min_y + size],
            [min_x, min_y + size],
            [min_x, min_y],
        ])
    }

    fn new_farm(code: FarmCode) -> NewFarm {
        NewFarm {
            farmer_id: None,
            name: None,
            region_code: code.region().to_string(),
            district_code: code.district().to_string(),
            farm_code: code,
            boundary: vec![],
            location: Some([0.5, 0.5]),
            area_hectares: None,
        }
    }

    #[tokio::test]
    async fn test_districts_covering_in_storage_order() {
        let store = MemoryRegionStore::new();
        let region = store.insert_region("Rift", Some("RR"), None).await.unwrap();
        store
            .insert_district(region.id, "Outer", Some("OU"), Some(square(0.0, 0.0, 4.0)))
            .await
            .unwrap();
        store
            .insert_district(region.id, "Inner", Some("IN"), Some(square(1.0, 1.0, 1.0)))
            .await
            .unwrap();
        store
            .insert_district(region.id, "Far", Some("FA"), Some(square(10.0, 10.0, 1.0)))
            .await
            .unwrap();
        store.insert_district(region.id, "Unmapped", Some("UM"), None).await.unwrap();

        let covering = store.districts_covering([1.5, 1.5]).await.unwrap();
        let names: Vec<&str> = covering.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Outer", "Inner"]);

        assert!(store.districts_covering([5.0, 5.0]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_districts_near() {
        let store = MemoryRegionStore::new();
        let region = store.insert_region("Rift", Some("RR"), None).await.unwrap();
        let district = store
            .insert_district(region.id, "Edge", Some("ED"), Some(square(0.0, 0.0, 1.0)))
            .await
            .unwrap();

        assert!(store.districts_covering([1.005, 0.5]).await.unwrap().is_empty());
        let near = store.districts_near([1.005, 0.5], 0.01).await.unwrap();
        assert_eq!(near, vec![district]);
        assert!(store.districts_near([1.5, 0.5], 0.01).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_region_codes_match_postgres_constraints() {
        let store = MemoryRegionStore::new();
        let region = store.insert_region("Rift", Some("RR"), None).await.unwrap();

        let duplicate = store.insert_region("Rift Again", Some("RR"), None).await;
        assert!(matches!(duplicate, Err(FarmgeoError::Storage(_))));

        let too_long = store.insert_region("Long", Some("ABCDEFGHIJK"), None).await;
        assert!(matches!(too_long, Err(FarmgeoError::Storage(_))));
        let long_district = store
            .insert_district(region.id, "Long", Some("ABCDEFGHIJK"), None)
            .await;
        assert!(matches!(long_district, Err(FarmgeoError::Storage(_))));

        // Uncoded regions never collide
        store.insert_region("Legacy A", None, None).await.unwrap();
        store.insert_region("Legacy B", None, None).await.unwrap();
        store.insert_region("Ten", Some("ABCDEFGHIJ"), None).await.unwrap();
        assert_eq!(store.list_regions().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_list_districts_in_storage_order() {
        let store = MemoryRegionStore::new();
        let rift = store.insert_region("Rift", Some("RR"), None).await.unwrap();
        let coast = store.insert_region("Coast", Some("CO"), None).await.unwrap();
        store.insert_district(coast.id, "Kilifi", Some("KF"), None).await.unwrap();
        store
            .insert_district(rift.id, "Nakuru", Some("NK"), Some(square(0.0, 0.0, 1.0)))
            .await
            .unwrap();

        let districts = store.list_districts().await.unwrap();
        let names: Vec<&str> = districts.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Kilifi", "Nakuru"]);
        assert_eq!(districts[1].region_id, rift.id);
    }

    #[tokio::test]
    async fn test_district_requires_region() {
        let store = MemoryRegionStore::new();
        let result = store.insert_district(RegionId(42), "Orphan", None, None).await;
        assert!(matches!(result, Err(FarmgeoError::Storage(_))));
    }

    #[tokio::test]
    async fn test_farm_code_uniqueness() {
        let store = MemoryFarmStore::new();
        let first = store.insert_farm(new_farm(FarmCode::new("ES", "RR", "AA", 1))).await.unwrap();
        assert_eq!(first.id(), FarmId(1));

        let duplicate = store.insert_farm(new_farm(FarmCode::new("ES", "RR", "AA", 1))).await;
        assert!(matches!(duplicate, Err(FarmgeoError::DuplicateFarmCode { .. })));
        assert_eq!(store.len(), 1);

        let second = store.insert_farm(new_farm(FarmCode::new("ES", "RR", "AA", 2))).await.unwrap();
        assert_eq!(second.id(), FarmId(2));
    }

    #[tokio::test]
    async fn test_update_geometry_and_validation() {
        let store = MemoryFarmStore::new();
        let mut farm = store
            .insert_farm(new_farm(FarmCode::new("ES", "RR", "AA", 1)))
            .await
            .unwrap();

        let ring = vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]];
        farm.apply_boundary(ring, Some([0.3, 0.6]), Some(10.0));
        store.update_farm_geometry(&farm).await.unwrap();
        store.mark_validated(farm.id()).await.unwrap();

        let stored = store.get_farm(farm.id()).await.unwrap().unwrap();
        assert!(stored.has_boundary_polygon());
        assert!(stored.validation_status());
        assert_eq!(stored.area_hectares(), Some(10.0));

        let missing = store.mark_validated(FarmId(99)).await;
        assert!(matches!(missing, Err(FarmgeoError::FarmNotFound { id: 99 })));
    }

    #[tokio::test]
    async fn test_sequence_scopes_are_independent() {
        let store = MemorySequenceStore::new();
        assert_eq!(store.next_value("farm").await.unwrap(), 1);
        assert_eq!(store.next_value("farm").await.unwrap(), 2);
        assert_eq!(store.next_value("RR-AA").await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sequence_values_are_never_repeated() {
        let store = MemorySequenceStore::new();
        let tasks = (0..64).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.next_value("farm").await.unwrap() })
        });

        let mut values: Vec<u64> =
            futures::future::join_all(tasks).await.into_iter().map(|v| v.unwrap()).collect();
        values.sort_unstable();
        assert_eq!(values, (1..=64).collect::<Vec<u64>>());
    }
}
