//! GeoJSON export for map clients.
//!
//! A farm is drawn as its boundary polygon, or as its location point when it
//! has no boundary. Farms with neither still appear, with a null geometry.
//! Regions and districts are drawn with their administrative boundaries.

use farmgeo_core::models::{District, Farm, Geometry, Region, RegionId};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::json;
use std::collections::HashMap;

fn into_object(value: serde_json::Value) -> JsonObject {
    match value {
        serde_json::Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

fn to_geojson_geometry(geometry: Option<&Geometry>) -> Option<geojson::Geometry> {
    geometry.and_then(|g| geojson::Geometry::from_json_value(g.to_geojson()).ok())
}

fn feature(id: u64, geometry: Option<geojson::Geometry>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry,
        id: Some(Id::Number(id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection { bbox: None, features, foreign_members: None }
}

fn farm_properties(farm: &Farm) -> JsonObject {
    into_object(json!({
        "id": farm.id().0,
        "farm_code": farm.farm_code().to_string(),
        "name": farm.display_name(),
        "area_hectares": farm.area_hectares(),
        "has_boundary": farm.has_boundary_polygon(),
        "has_location": farm.location().is_some(),
        "validation_status": farm.validation_status(),
        "region_code": farm.region_code(),
        "district_code": farm.district_code(),
    }))
}

/// Map feature for a single farm
pub fn farm_feature(farm: &Farm) -> Feature {
    let shape = farm.boundary_geometry().or_else(|| farm.location_geometry());
    feature(farm.id().0, to_geojson_geometry(shape.as_ref()), farm_properties(farm))
}

/// Map layer with every given farm
pub fn farm_collection(farms: &[Farm]) -> FeatureCollection {
    collection(farms.iter().map(farm_feature).collect())
}

/// Region layer; each region carries the number of its districts
pub fn region_collection(regions: &[Region], districts: &[District]) -> FeatureCollection {
    let mut district_counts: HashMap<RegionId, usize> = HashMap::new();
    for district in districts {
        *district_counts.entry(district.region_id).or_default() += 1;
    }

    collection(
        regions
            .iter()
            .map(|region| {
                let properties = into_object(json!({
                    "id": region.id.0,
                    "name": region.name,
                    "code": region.code,
                    "district_count": district_counts.get(&region.id).copied().unwrap_or(0),
                }));
                feature(region.id.0, to_geojson_geometry(region.boundary.as_ref()), properties)
            })
            .collect(),
    )
}

/// District layer, labelled with the owning region's name and code
pub fn district_collection(districts: &[District], regions: &[Region]) -> FeatureCollection {
    let regions: HashMap<RegionId, &Region> = regions.iter().map(|r| (r.id, r)).collect();

    collection(
        districts
            .iter()
            .map(|district| {
                let region = regions.get(&district.region_id);
                let properties = into_object(json!({
                    "id": district.id.0,
                    "name": district.name,
                    "code": district.code,
                    "region": region.map(|r| r.name.as_str()),
                    "region_code": region.and_then(|r| r.code.as_deref()),
                }));
                feature(district.id.0, to_geojson_geometry(district.boundary.as_ref()), properties)
            })
            .collect(),
    )
}
