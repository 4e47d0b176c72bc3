//! Connection settings for the PostgreSQL farm store

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { key: key.to_string(), reason: reason.into() }
}

/// Connection pool and schema settings for [`super::PostgresStore`]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// How long a registration waits for a pooled connection
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    /// Apply pending migrations when the store connects
    pub auto_migrate: bool,
}

impl PostgresConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            auto_migrate: false,
        }
    }

    /// Read `DATABASE_URL` plus the optional `FARMGEO_DB_MAX_CONNECTIONS`,
    /// `FARMGEO_DB_ACQUIRE_TIMEOUT_MS` and `FARMGEO_DB_AUTO_MIGRATE`
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?;
        let mut config = Self::new(database_url);

        if let Ok(max) = std::env::var("FARMGEO_DB_MAX_CONNECTIONS") {
            config.max_connections = max.parse().map_err(|_| {
                let reason = format!("'{}' is not a positive integer", max);
                invalid("FARMGEO_DB_MAX_CONNECTIONS", reason)
            })?;
        }

        if let Ok(ms) = std::env::var("FARMGEO_DB_ACQUIRE_TIMEOUT_MS") {
            let ms: u64 = ms.parse().map_err(|_| {
                invalid("FARMGEO_DB_ACQUIRE_TIMEOUT_MS", format!("'{}' is not milliseconds", ms))
            })?;
            config.acquire_timeout = Duration::from_millis(ms);
        }

        if let Ok(flag) = std::env::var("FARMGEO_DB_AUTO_MIGRATE") {
            let flag = flag.to_ascii_lowercase();
            config.auto_migrate = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_auto_migrate(mut self, auto_migrate: bool) -> Self {
        self.auto_migrate = auto_migrate;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database_url.trim();
        if url.is_empty() {
            return Err(invalid("database_url", "cannot be empty"));
        }
        if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
            return Err(invalid("database_url", "expected a postgres:// or postgresql:// URL"));
        }
        if self.max_connections == 0 {
            return Err(invalid("max_connections", "must be greater than 0"));
        }
        if self.acquire_timeout.is_zero() {
            return Err(invalid("acquire_timeout", "must be greater than 0"));
        }
        Ok(())
    }

    /// Pool options built from these settings
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
    }
}
