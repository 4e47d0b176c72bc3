use async_trait::async_trait;
use chrono::{DateTime, Utc};
use farmgeo_core::error::{FarmgeoError, Result};
use farmgeo_core::models::{Farm, FarmCode, FarmId, FarmerId, Geometry, NewFarm};
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::{geometry_param, parse_geometry, storage_error, PostgresStore};
use crate::ports::FarmStore;

const FARM_COLUMNS: &str = r#"
    id, farmer_id, name, farm_code, region_code, district_code,
    ST_AsGeoJSON(boundary) AS boundary, ST_AsGeoJSON(location) AS location,
    area_hectares, validation_status, registration_date
"#;

fn farm_from_row(row: &PgRow) -> Result<Farm> {
    let code: String = row.get("farm_code");
    let farm_code = FarmCode::parse(&code)
        .ok_or_else(|| FarmgeoError::Serialization(format!("malformed farm code: {}", code)))?;

    let boundary = parse_geometry("farms.boundary", row.get("boundary"))?
        .and_then(|g| g.exterior().map(<[_]>::to_vec))
        .unwrap_or_default();
    let location = match parse_geometry("farms.location", row.get("location"))? {
        Some(Geometry::Point { coordinates }) => Some(coordinates),
        _ => None,
    };

    let new = NewFarm {
        farmer_id: row.get::<Option<i64>, _>("farmer_id").map(|id| FarmerId(id as u64)),
        name: row.get("name"),
        farm_code,
        region_code: row.get("region_code"),
        district_code: row.get("district_code"),
        boundary,
        location,
        area_hectares: row.get("area_hectares"),
    };

    let registered_at: DateTime<Utc> = row.get("registration_date");
    let mut farm = Farm::from_new(FarmId(row.get::<i64, _>("id") as u64), new, registered_at);
    if row.get::<bool, _>("validation_status") {
        farm.confirm_boundary();
    }
    Ok(farm)
}

fn boundary_param(ring: &[[f64; 2]]) -> Option<String> {
    if ring.is_empty() {
        None
    } else {
        geometry_param(Some(&Geometry::from_ring(ring.to_vec())))
    }
}

fn location_param(location: Option<[f64; 2]>) -> Option<String> {
    geometry_param(location.map(|[lng, lat]| Geometry::point(lng, lat)).as_ref())
}

#[async_trait]
impl FarmStore for PostgresStore {
    async fn insert_farm(&self, farm: NewFarm) -> Result<Farm> {
        let code = farm.farm_code.to_string();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO farms (
                farmer_id, name, farm_code, region_code, district_code,
                boundary, location, area_hectares, has_boundary_polygon
            )
            VALUES (
                $1, $2, $3, $4, $5,
                ST_SetSRID(ST_GeomFromGeoJSON($6), 4326),
                ST_SetSRID(ST_GeomFromGeoJSON($7), 4326),
                $8, $9
            )
            RETURNING {FARM_COLUMNS}
            "#
        ))
        .bind(farm.farmer_id.map(|id| id.0 as i64))
        .bind(&farm.name)
        .bind(&code)
        .bind(&farm.region_code)
        .bind(&farm.district_code)
        .bind(boundary_param(&farm.boundary))
        .bind(location_param(farm.location))
        .bind(farm.area_hectares)
        .bind(!farm.boundary.is_empty())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                FarmgeoError::DuplicateFarmCode { code: code.clone() }
            }
            other => storage_error("Failed to insert farm", other),
        })?;

        farm_from_row(&row)
    }

    async fn get_farm(&self, id: FarmId) -> Result<Option<Farm>> {
        let row = sqlx::query(&format!("SELECT {FARM_COLUMNS} FROM farms WHERE id = $1"))
            .bind(id.0 as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to get farm", e))?;

        row.as_ref().map(farm_from_row).transpose()
    }

    async fn list_farms(&self) -> Result<Vec<Farm>> {
        let rows = sqlx::query(&format!("SELECT {FARM_COLUMNS} FROM farms ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to list farms", e))?;

        rows.iter().map(farm_from_row).collect()
    }

    async fn update_farm_geometry(&self, farm: &Farm) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE farms
            SET boundary = ST_SetSRID(ST_GeomFromGeoJSON($2), 4326),
                location = ST_SetSRID(ST_GeomFromGeoJSON($3), 4326),
                area_hectares = $4,
                has_boundary_polygon = $5
            WHERE id = $1
            "#,
        )
        .bind(farm.id().0 as i64)
        .bind(boundary_param(farm.boundary()))
        .bind(location_param(farm.location()))
        .bind(farm.area_hectares())
        .bind(farm.has_boundary_polygon())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update farm geometry", e))?;

        if result.rows_affected() == 0 {
            return Err(FarmgeoError::FarmNotFound { id: farm.id().0 });
        }
        Ok(())
    }

    async fn mark_validated(&self, id: FarmId) -> Result<()> {
        let result = sqlx::query("UPDATE farms SET validation_status = TRUE WHERE id = $1")
            .bind(id.0 as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to update validation status", e))?;

        if result.rows_affected() == 0 {
            return Err(FarmgeoError::FarmNotFound { id: id.0 });
        }
        Ok(())
    }
}
