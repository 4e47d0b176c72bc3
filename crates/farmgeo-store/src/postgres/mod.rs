//! PostgreSQL/PostGIS storage adapter
//!
//! One [`PostgresStore`] implements every storage port. Geometry crosses the
//! wire as GeoJSON (`ST_GeomFromGeoJSON` / `ST_AsGeoJSON`).

pub mod config;
pub mod farms;
pub mod migrations;
pub mod regions;
pub mod sequence;

pub use config::{ConfigError, PostgresConfig};
pub use migrations::{MigrationError, MigrationStatus};

use farmgeo_core::error::{FarmgeoError, Result};
use farmgeo_core::models::Geometry;
use sqlx::PgPool;

/// PostgreSQL storage adapter
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresStore {
    /// Connect with the given configuration, migrating first when `auto_migrate` is set
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        config.validate().map_err(|e| match e {
            ConfigError::Missing(key) => FarmgeoError::ConfigMissing { key },
            ConfigError::Invalid { key, reason } => FarmgeoError::ConfigInvalid { key, reason },
        })?;

        let pool = config
            .pool_options()
            .connect(&config.database_url)
            .await
            .map_err(|e| storage_error("Failed to connect to database", e))?;

        let store = Self { pool, config };
        store.health_check().await?;

        if store.config.auto_migrate {
            store.run_migrations().await?;
        }

        tracing::info!(
            max_connections = store.config.max_connections,
            auto_migrate = store.config.auto_migrate,
            "Connected to PostgreSQL farm store"
        );
        Ok(store)
    }

    /// Connect and apply pending migrations regardless of `auto_migrate`
    pub async fn with_migrations(config: PostgresConfig) -> Result<Self> {
        Self::new(config.with_auto_migrate(true)).await
    }

    pub async fn run_migrations(&self) -> Result<()> {
        migrations::apply(&self.pool)
            .await
            .map_err(|e| FarmgeoError::Storage(e.to_string()))
    }

    pub async fn migration_status(&self) -> Result<Vec<MigrationStatus>> {
        migrations::status(&self.pool)
            .await
            .map_err(|e| FarmgeoError::Storage(e.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    /// Round-trip a trivial query and confirm PostGIS is installed
    pub async fn health_check(&self) -> Result<()> {
        let (version,): (Option<String>,) = sqlx::query_as(
            "SELECT (SELECT extversion FROM pg_extension WHERE extname = 'postgis')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Health check failed", e))?;

        match version {
            Some(version) => {
                tracing::debug!(postgis = %version, "Database health check passed");
                Ok(())
            }
            None if !self.config.auto_migrate => Err(FarmgeoError::Storage(
                "PostGIS extension is not installed".to_string(),
            )),
            // The initial migration creates the extension
            None => Ok(()),
        }
    }
}

pub(crate) fn storage_error(context: &str, error: sqlx::Error) -> FarmgeoError {
    FarmgeoError::Storage(format!("{}: {}", context, error))
}

/// Serialize a geometry for `ST_GeomFromGeoJSON`
pub(crate) fn geometry_param(geometry: Option<&Geometry>) -> Option<String> {
    geometry.map(|g| g.to_geojson().to_string())
}

/// Parse the text produced by `ST_AsGeoJSON`
pub(crate) fn parse_geometry(column: &str, text: Option<String>) -> Result<Option<Geometry>> {
    let Some(text) = text else {
        return Ok(None);
    };

    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| FarmgeoError::Serialization(format!("{} is not JSON: {}", column, e)))?;

    Geometry::from_geojson(&value).map(Some).ok_or_else(|| {
        FarmgeoError::Serialization(format!("{} holds an unsupported geometry: {}", column, text))
    })
}
