use farmgeo_core::config::{RegistryConfig, SequenceScope};
use farmgeo_core::error::Result;
use farmgeo_core::models::FarmCode;
use farmgeo_store::ports::SequenceStore;

/// Counter key shared by every farm under [`SequenceScope::Global`]
pub const GLOBAL_SEQUENCE_KEY: &str = "global";

/// Sequence counter key for a resolved region/district pair
pub fn sequence_key(scope: SequenceScope, region_code: &str, district_code: &str) -> String {
    match scope {
        SequenceScope::Global => GLOBAL_SEQUENCE_KEY.to_string(),
        SequenceScope::PerDistrict => format!("{}-{}", region_code, district_code),
    }
}

/// Mints `<PREFIX>-<REGION>-<DISTRICT>-<NNNNNN>` farm codes from a durable counter
pub struct FarmCodeGenerator<Q: SequenceStore> {
    sequences: Q,
    prefix: String,
    scope: SequenceScope,
}

impl<Q: SequenceStore> FarmCodeGenerator<Q> {
    pub fn new(sequences: Q, config: &RegistryConfig) -> Self {
        Self { sequences, prefix: config.code_prefix.clone(), scope: config.sequence_scope }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Allocate a fresh sequence value and build a code from it.
    ///
    /// Every call consumes a new value, so a retried registration never reuses
    /// a code it already tried.
    pub async fn next_code(&self, region_code: &str, district_code: &str) -> Result<FarmCode> {
        let key = sequence_key(self.scope, region_code, district_code);
        let sequence = self.sequences.next_value(&key).await?;
        Ok(FarmCode::new(self.prefix.as_str(), region_code, district_code, sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmgeo_store::memory::MemorySequenceStore;

    #[test]
    fn test_sequence_keys() {
        assert_eq!(sequence_key(SequenceScope::Global, "RR", "AA"), "global");
        assert_eq!(sequence_key(SequenceScope::PerDistrict, "RR", "AA"), "RR-AA");
    }

    #[tokio::test]
    async fn test_global_scope_counts_across_districts() {
        let generator =
            FarmCodeGenerator::new(MemorySequenceStore::new(), &RegistryConfig::default());

        let first = generator.next_code("RR", "AA").await.unwrap();
        let second = generator.next_code("CO", "KF").await.unwrap();
        assert_eq!(first.to_string(), "ES-RR-AA-000001");
        assert_eq!(second.to_string(), "ES-CO-KF-000002");
    }

    #[tokio::test]
    async fn test_per_district_scope() {
        let config = RegistryConfig {
            sequence_scope: SequenceScope::PerDistrict,
            ..RegistryConfig::default().with_prefix("EX")
        };
        let generator = FarmCodeGenerator::new(MemorySequenceStore::new(), &config);

        assert_eq!(generator.next_code("RR", "AA").await.unwrap().to_string(), "EX-RR-AA-000001");
        assert_eq!(generator.next_code("CO", "KF").await.unwrap().to_string(), "EX-CO-KF-000001");
        assert_eq!(generator.next_code("RR", "AA").await.unwrap().to_string(), "EX-RR-AA-000002");
        assert_eq!(generator.prefix(), "EX");
    }
}
