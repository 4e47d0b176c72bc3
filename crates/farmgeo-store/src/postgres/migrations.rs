//! Schema migrations embedded from `migrations/`

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;
use std::collections::HashSet;
use thiserror::Error;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Applying migrations failed: {0}")]
    Apply(#[from] MigrateError),

    #[error("Reading the migration ledger failed: {0}")]
    Ledger(#[from] sqlx::Error),
}

/// One embedded migration and whether the database has it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

/// Apply every pending migration in version order
pub async fn apply(pool: &PgPool) -> Result<(), MigrationError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Status of every embedded migration
pub async fn status(pool: &PgPool) -> Result<Vec<MigrationStatus>, MigrationError> {
    let applied = applied_versions(pool).await?;

    Ok(MIGRATOR
        .iter()
        .map(|migration| MigrationStatus {
            version: migration.version,
            description: migration.description.to_string(),
            applied: applied.contains(&migration.version),
        })
        .collect())
}

async fn applied_versions(pool: &PgPool) -> Result<HashSet<i64>, MigrationError> {
    // sqlx creates its ledger table on the first run
    let (ledger_exists,): (bool,) =
        sqlx::query_as("SELECT to_regclass('_sqlx_migrations') IS NOT NULL").fetch_one(pool).await?;
    if !ledger_exists {
        return Ok(HashSet::new());
    }

    let rows: Vec<(i64,)> = sqlx::query_as("SELECT version FROM _sqlx_migrations WHERE success")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(version,)| version).collect())
}
