use async_trait::async_trait;
use farmgeo_core::error::Result;
use farmgeo_core::models::{
    District, DistrictId, Farmer, FarmerId, Geometry, LngLat, Region, RegionId,
};
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::{geometry_param, parse_geometry, storage_error, PostgresStore};
use crate::ports::{FarmerStore, RegionStore};

const REGION_COLUMNS: &str = "id, name, code, ST_AsGeoJSON(boundary) AS boundary";
const DISTRICT_COLUMNS: &str = "id, region_id, name, code, ST_AsGeoJSON(boundary) AS boundary";

fn region_from_row(row: &PgRow) -> Result<Region> {
    Ok(Region {
        id: RegionId(row.get::<i64, _>("id") as u64),
        name: row.get("name"),
        code: row.get("code"),
        boundary: parse_geometry("regions.boundary", row.get("boundary"))?,
    })
}

fn district_from_row(row: &PgRow) -> Result<District> {
    Ok(District {
        id: DistrictId(row.get::<i64, _>("id") as u64),
        region_id: RegionId(row.get::<i64, _>("region_id") as u64),
        name: row.get("name"),
        code: row.get("code"),
        boundary: parse_geometry("districts.boundary", row.get("boundary"))?,
    })
}

#[async_trait]
impl RegionStore for PostgresStore {
    async fn insert_region(
        &self,
        name: &str,
        code: Option<&str>,
        boundary: Option<Geometry>,
    ) -> Result<Region> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO regions (name, code, boundary)
            VALUES ($1, $2, ST_SetSRID(ST_GeomFromGeoJSON($3), 4326))
            RETURNING {REGION_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(code)
        .bind(geometry_param(boundary.as_ref()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to insert region", e))?;

        region_from_row(&row)
    }

    async fn insert_district(
        &self,
        region_id: RegionId,
        name: &str,
        code: Option<&str>,
        boundary: Option<Geometry>,
    ) -> Result<District> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO districts (region_id, name, code, boundary)
            VALUES ($1, $2, $3, ST_SetSRID(ST_GeomFromGeoJSON($4), 4326))
            RETURNING {DISTRICT_COLUMNS}
            "#
        ))
        .bind(region_id.0 as i64)
        .bind(name)
        .bind(code)
        .bind(geometry_param(boundary.as_ref()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to insert district", e))?;

        district_from_row(&row)
    }

    async fn get_region(&self, id: RegionId) -> Result<Option<Region>> {
        let row = sqlx::query(&format!("SELECT {REGION_COLUMNS} FROM regions WHERE id = $1"))
            .bind(id.0 as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to get region", e))?;

        row.as_ref().map(region_from_row).transpose()
    }

    async fn get_district(&self, id: DistrictId) -> Result<Option<District>> {
        let row = sqlx::query(&format!("SELECT {DISTRICT_COLUMNS} FROM districts WHERE id = $1"))
            .bind(id.0 as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to get district", e))?;

        row.as_ref().map(district_from_row).transpose()
    }

    async fn list_regions(&self) -> Result<Vec<Region>> {
        let rows = sqlx::query(&format!("SELECT {REGION_COLUMNS} FROM regions ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to list regions", e))?;

        rows.iter().map(region_from_row).collect()
    }

    async fn list_districts(&self) -> Result<Vec<District>> {
        let rows = sqlx::query(&format!("SELECT {DISTRICT_COLUMNS} FROM districts ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to list districts", e))?;

        rows.iter().map(district_from_row).collect()
    }

    async fn districts_covering(&self, point: LngLat) -> Result<Vec<District>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {DISTRICT_COLUMNS}
            FROM districts
            WHERE boundary IS NOT NULL
              AND ST_Covers(boundary, ST_SetSRID(ST_MakePoint($1, $2), 4326))
            ORDER BY id
            "#
        ))
        .bind(point[0])
        .bind(point[1])
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Containment query failed", e))?;

        rows.iter().map(district_from_row).collect()
    }

    async fn districts_near(&self, point: LngLat, radius: f64) -> Result<Vec<District>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {DISTRICT_COLUMNS}
            FROM districts
            WHERE boundary IS NOT NULL
              AND ST_Intersects(boundary, ST_Buffer(ST_SetSRID(ST_MakePoint($1, $2), 4326), $3))
            ORDER BY id
            "#
        ))
        .bind(point[0])
        .bind(point[1])
        .bind(radius)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Proximity query failed", e))?;

        rows.iter().map(district_from_row).collect()
    }
}

#[async_trait]
impl FarmerStore for PostgresStore {
    async fn insert_farmer(&self, district_id: Option<DistrictId>) -> Result<Farmer> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO farmers (district_id) VALUES ($1) RETURNING id")
                .bind(district_id.map(|d| d.0 as i64))
                .fetch_one(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to insert farmer", e))?;

        Ok(Farmer { id: FarmerId(id as u64), district_id })
    }

    async fn get_farmer(&self, id: FarmerId) -> Result<Option<Farmer>> {
        let district: Option<Option<i64>> =
            sqlx::query_scalar("SELECT district_id FROM farmers WHERE id = $1")
                .bind(id.0 as i64)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to get farmer", e))?;

        Ok(district.map(|district_id| Farmer {
            id,
            district_id: district_id.map(|d| DistrictId(d as u64)),
        }))
    }
}
