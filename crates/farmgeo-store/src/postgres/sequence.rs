use async_trait::async_trait;
use farmgeo_core::error::Result;

use super::{storage_error, PostgresStore};
use crate::ports::SequenceStore;

#[async_trait]
impl SequenceStore for PostgresStore {
    async fn next_value(&self, scope: &str) -> Result<u64> {
        // Single statement, so concurrent callers serialize on the row lock
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO farm_code_sequences (scope, value)
            VALUES ($1, 1)
            ON CONFLICT (scope) DO UPDATE SET value = farm_code_sequences.value + 1
            RETURNING value
            "#,
        )
        .bind(scope)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to allocate farm code sequence", e))?;

        Ok(value as u64)
    }
}
