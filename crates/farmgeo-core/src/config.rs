use crate::error::{FarmgeoError, Result};
use crate::models::AreaProjection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Set programmatically by the embedding service
    Override,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Override => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Scope a farm-code sequence counter is shared across
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SequenceScope {
    /// One counter for every farm
    #[default]
    Global,
    /// One counter per region/district pair
    PerDistrict,
}

/// Tie-break when a point falls inside several overlapping district boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OverlapPolicy {
    /// Prefer the containing district with the smallest boundary area
    #[default]
    SmallestArea,
    /// Take the first containing district in storage order
    StorageOrder,
}

/// Resolved, validated settings consumed by the farm registry
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    /// Registration channel prefix, e.g. `ES`
    pub code_prefix: String,
    pub sequence_scope: SequenceScope,
    pub overlap_policy: OverlapPolicy,
    /// Radius of the proximity fallback, in degrees
    pub buffer_radius_degrees: f64,
    pub area_projection: AreaProjection,
    /// Upper bound for each spatial lookup tier
    pub lookup_timeout: Duration,
    /// Attempts at allocating a farm code before giving up
    pub max_code_attempts: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            code_prefix: DEFAULT_CODE_PREFIX.to_string(),
            sequence_scope: SequenceScope::Global,
            overlap_policy: OverlapPolicy::SmallestArea,
            buffer_radius_degrees: DEFAULT_BUFFER_RADIUS,
            area_projection: AreaProjection::LocalUtm,
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }
}

impl RegistryConfig {
    /// Same settings with a different code prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.code_prefix = prefix.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_code_prefix(&self.code_prefix)?;

        if !self.buffer_radius_degrees.is_finite() || self.buffer_radius_degrees < 0.0 {
            return Err(FarmgeoError::ConfigInvalid {
                key: "buffer_radius_degrees".to_string(),
                reason: format!(
                    "must be a finite, non-negative number of degrees, got {}",
                    self.buffer_radius_degrees
                ),
            });
        }

        if self.lookup_timeout.is_zero() {
            return Err(FarmgeoError::ConfigInvalid {
                key: "lookup_timeout_ms".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.max_code_attempts == 0 {
            return Err(FarmgeoError::ConfigInvalid {
                key: "max_code_attempts".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

const DEFAULT_CODE_PREFIX: &str = "ES";
const DEFAULT_BUFFER_RADIUS: f64 = 0.01;
const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 5;

/// Layered configuration for the farm registry
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub code_prefix: ConfigValue<String>,
    pub sequence_scope: ConfigValue<SequenceScope>,
    pub overlap_policy: ConfigValue<OverlapPolicy>,
    pub buffer_radius_degrees: ConfigValue<f64>,
    pub area_projection: ConfigValue<AreaProjection>,
    pub lookup_timeout_ms: ConfigValue<u64>,
    pub max_code_attempts: ConfigValue<u32>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            code_prefix: ConfigValue::new(DEFAULT_CODE_PREFIX.to_string(), ConfigSource::Default),
            sequence_scope: ConfigValue::new(SequenceScope::Global, ConfigSource::Default),
            overlap_policy: ConfigValue::new(OverlapPolicy::SmallestArea, ConfigSource::Default),
            buffer_radius_degrees: ConfigValue::new(DEFAULT_BUFFER_RADIUS, ConfigSource::Default),
            area_projection: ConfigValue::new(AreaProjection::LocalUtm, ConfigSource::Default),
            lookup_timeout_ms: ConfigValue::new(DEFAULT_LOOKUP_TIMEOUT_MS, ConfigSource::Default),
            max_code_attempts: ConfigValue::new(DEFAULT_MAX_CODE_ATTEMPTS, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| FarmgeoError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| FarmgeoError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(prefix) = file_config.code_prefix {
            self.code_prefix.update(prefix, ConfigSource::File);
        }

        if let Some(scope) = file_config.sequence_scope {
            self.sequence_scope.update(scope, ConfigSource::File);
        }

        if let Some(policy) = file_config.overlap_policy {
            self.overlap_policy.update(policy, ConfigSource::File);
        }

        if let Some(radius) = file_config.buffer_radius_degrees {
            self.buffer_radius_degrees.update(radius, ConfigSource::File);
        }

        if let Some(projection) = file_config.area_projection {
            self.area_projection.update(projection, ConfigSource::File);
        }

        if let Some(timeout) = file_config.lookup_timeout_ms {
            self.lookup_timeout_ms.update(timeout, ConfigSource::File);
        }

        if let Some(attempts) = file_config.max_code_attempts {
            self.max_code_attempts.update(attempts, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // FARMGEO_CODE_PREFIX
        if let Ok(prefix) = env::var("FARMGEO_CODE_PREFIX") {
            match validate_code_prefix(&prefix) {
                Ok(()) => self.code_prefix.update(prefix, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring FARMGEO_CODE_PREFIX: {}", e),
            }
        }

        // FARMGEO_SEQUENCE_SCOPE
        if let Ok(scope_str) = env::var("FARMGEO_SEQUENCE_SCOPE") {
            match parse_sequence_scope(&scope_str) {
                Ok(scope) => self.sequence_scope.update(scope, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FARMGEO_SEQUENCE_SCOPE value '{}': expected global or district",
                    scope_str
                ),
            }
        }

        // FARMGEO_OVERLAP_POLICY
        if let Ok(policy_str) = env::var("FARMGEO_OVERLAP_POLICY") {
            match parse_overlap_policy(&policy_str) {
                Ok(policy) => self.overlap_policy.update(policy, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FARMGEO_OVERLAP_POLICY '{}': expected smallest-area or storage-order",
                    policy_str
                ),
            }
        }

        // FARMGEO_BUFFER_RADIUS
        if let Ok(radius_str) = env::var("FARMGEO_BUFFER_RADIUS") {
            match radius_str.parse::<f64>() {
                Ok(radius) if radius.is_finite() && radius >= 0.0 => {
                    self.buffer_radius_degrees.update(radius, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid FARMGEO_BUFFER_RADIUS value '{}': expected non-negative degrees",
                    radius_str
                ),
            }
        }

        // FARMGEO_AREA_PROJECTION
        if let Ok(projection_str) = env::var("FARMGEO_AREA_PROJECTION") {
            match parse_area_projection(&projection_str) {
                Ok(projection) => {
                    self.area_projection.update(projection, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid FARMGEO_AREA_PROJECTION value '{}': expected utm or web-mercator",
                    projection_str
                ),
            }
        }

        // FARMGEO_LOOKUP_TIMEOUT_MS
        if let Ok(timeout_str) = env::var("FARMGEO_LOOKUP_TIMEOUT_MS") {
            match timeout_str.parse::<u64>() {
                Ok(timeout) if timeout > 0 => {
                    self.lookup_timeout_ms.update(timeout, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid FARMGEO_LOOKUP_TIMEOUT_MS value '{}': expected positive integer",
                    timeout_str
                ),
            }
        }

        // FARMGEO_MAX_CODE_ATTEMPTS
        if let Ok(attempts_str) = env::var("FARMGEO_MAX_CODE_ATTEMPTS") {
            match attempts_str.parse::<u32>() {
                Ok(attempts) if attempts > 0 => {
                    self.max_code_attempts.update(attempts, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid FARMGEO_MAX_CODE_ATTEMPTS value '{}': expected positive integer",
                    attempts_str
                ),
            }
        }

        self
    }

    /// Apply programmatic overrides from the embedding service
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(prefix) = overrides.code_prefix {
            self.code_prefix.update(prefix, ConfigSource::Override);
        }

        if let Some(scope) = overrides.sequence_scope {
            self.sequence_scope.update(scope, ConfigSource::Override);
        }

        if let Some(policy) = overrides.overlap_policy {
            self.overlap_policy.update(policy, ConfigSource::Override);
        }

        if let Some(radius) = overrides.buffer_radius_degrees {
            self.buffer_radius_degrees.update(radius, ConfigSource::Override);
        }

        if let Some(projection) = overrides.area_projection {
            self.area_projection.update(projection, ConfigSource::Override);
        }

        if let Some(timeout) = overrides.lookup_timeout_ms {
            self.lookup_timeout_ms.update(timeout, ConfigSource::Override);
        }

        if let Some(attempts) = overrides.max_code_attempts {
            self.max_code_attempts.update(attempts, ConfigSource::Override);
        }
    }

    /// Validate and freeze into the settings the registry runs with
    pub fn resolve(&self) -> Result<RegistryConfig> {
        let config = RegistryConfig {
            code_prefix: self.code_prefix.value.clone(),
            sequence_scope: self.sequence_scope.value,
            overlap_policy: self.overlap_policy.value,
            buffer_radius_degrees: self.buffer_radius_degrees.value,
            area_projection: self.area_projection.value,
            lookup_timeout: Duration::from_millis(self.lookup_timeout_ms.value),
            max_code_attempts: self.max_code_attempts.value,
        };
        config.validate()?;
        Ok(config)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "code_prefix".to_string(),
            (self.code_prefix.value.clone(), self.code_prefix.source),
        );

        map.insert(
            "sequence_scope".to_string(),
            (format!("{:?}", self.sequence_scope.value), self.sequence_scope.source),
        );

        map.insert(
            "overlap_policy".to_string(),
            (format!("{:?}", self.overlap_policy.value), self.overlap_policy.source),
        );

        map.insert(
            "buffer_radius_degrees".to_string(),
            (self.buffer_radius_degrees.value.to_string(), self.buffer_radius_degrees.source),
        );

        map.insert(
            "area_projection".to_string(),
            (format!("{:?}", self.area_projection.value), self.area_projection.source),
        );

        map.insert(
            "lookup_timeout_ms".to_string(),
            (self.lookup_timeout_ms.value.to_string(), self.lookup_timeout_ms.source),
        );

        map.insert(
            "max_code_attempts".to_string(),
            (self.max_code_attempts.value.to_string(), self.max_code_attempts.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    code_prefix: Option<String>,
    sequence_scope: Option<SequenceScope>,
    overlap_policy: Option<OverlapPolicy>,
    buffer_radius_degrees: Option<f64>,
    area_projection: Option<AreaProjection>,
    lookup_timeout_ms: Option<u64>,
    max_code_attempts: Option<u32>,
}

/// Programmatic configuration overrides
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub code_prefix: Option<String>,
    pub sequence_scope: Option<SequenceScope>,
    pub overlap_policy: Option<OverlapPolicy>,
    pub buffer_radius_degrees: Option<f64>,
    pub area_projection: Option<AreaProjection>,
    pub lookup_timeout_ms: Option<u64>,
    pub max_code_attempts: Option<u32>,
}

/// Check that a prefix can lead a farm code
pub fn validate_code_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() || prefix.len() > 10 || !prefix.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(FarmgeoError::ConfigInvalid {
            key: "code_prefix".to_string(),
            reason: format!("'{}' must be 1-10 ASCII letters or digits", prefix),
        });
    }
    Ok(())
}

/// Parse sequence scope from string
pub fn parse_sequence_scope(s: &str) -> Result<SequenceScope> {
    match s.to_lowercase().as_str() {
        "global" => Ok(SequenceScope::Global),
        "district" | "per-district" | "per_district" => Ok(SequenceScope::PerDistrict),
        _ => Err(FarmgeoError::ConfigInvalid {
            key: "sequence_scope".to_string(),
            reason: format!("Invalid sequence scope: {}. Use global or district", s),
        }),
    }
}

/// Parse overlap policy from string
pub fn parse_overlap_policy(s: &str) -> Result<OverlapPolicy> {
    match s.to_lowercase().as_str() {
        "smallest-area" | "smallest_area" | "smallest" => Ok(OverlapPolicy::SmallestArea),
        "storage-order" | "storage_order" | "first" => Ok(OverlapPolicy::StorageOrder),
        _ => Err(FarmgeoError::ConfigInvalid {
            key: "overlap_policy".to_string(),
            reason: format!("Invalid overlap policy: {}. Use smallest-area or storage-order", s),
        }),
    }
}

/// Parse area projection from string
pub fn parse_area_projection(s: &str) -> Result<AreaProjection> {
    match s.to_lowercase().as_str() {
        "utm" | "local-utm" | "local_utm" => Ok(AreaProjection::LocalUtm),
        "web-mercator" | "web_mercator" | "3857" | "epsg:3857" => Ok(AreaProjection::WebMercator),
        _ => Err(FarmgeoError::ConfigInvalid {
            key: "area_projection".to_string(),
            reason: format!("Invalid area projection: {}. Use utm or web-mercator", s),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.code_prefix.value, "ES");
        assert_eq!(config.code_prefix.source, ConfigSource::Default);
        assert_eq!(config.sequence_scope.value, SequenceScope::Global);
        assert_eq!(config.buffer_radius_degrees.value, 0.01);

        assert_eq!(config.resolve().unwrap(), RegistryConfig::default());
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        value.update(400, ConfigSource::Override);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Override);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Override);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
code_prefix = "EX"
sequence_scope = "PerDistrict"
overlap_policy = "StorageOrder"
buffer_radius_degrees = 0.02
area_projection = "WebMercator"
lookup_timeout_ms = 250
max_code_attempts = 3
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();
        assert_eq!(config.code_prefix.value, "EX");
        assert_eq!(config.code_prefix.source, ConfigSource::File);

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.sequence_scope, SequenceScope::PerDistrict);
        assert_eq!(resolved.overlap_policy, OverlapPolicy::StorageOrder);
        assert_eq!(resolved.buffer_radius_degrees, 0.02);
        assert_eq!(resolved.area_projection, AreaProjection::WebMercator);
        assert_eq!(resolved.lookup_timeout, Duration::from_millis(250));
        assert_eq!(resolved.max_code_attempts, 3);
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/farmgeo.toml");
        assert!(matches!(result, Err(FarmgeoError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.apply_overrides(ConfigOverrides {
            code_prefix: Some("EX".to_string()),
            max_code_attempts: Some(10),
            ..Default::default()
        });

        assert_eq!(config.code_prefix.value, "EX");
        assert_eq!(config.code_prefix.source, ConfigSource::Override);
        assert_eq!(config.max_code_attempts.value, 10);
        assert_eq!(config.overlap_policy.source, ConfigSource::Default);
    }

    #[test]
    fn test_resolve_rejects_bad_values() {
        let mut config = LayeredConfig::with_defaults();
        config.apply_overrides(ConfigOverrides {
            code_prefix: Some("E-S".to_string()),
            ..Default::default()
        });
        assert!(config.resolve().is_err());

        let mut config = LayeredConfig::with_defaults();
        config.apply_overrides(ConfigOverrides {
            max_code_attempts: Some(0),
            ..Default::default()
        });
        assert!(config.resolve().is_err());

        let mut config = LayeredConfig::with_defaults();
        config.apply_overrides(ConfigOverrides {
            buffer_radius_degrees: Some(f64::NAN),
            ..Default::default()
        });
        assert!(config.resolve().is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_sequence_scope("GLOBAL").unwrap(), SequenceScope::Global);
        assert_eq!(parse_sequence_scope("district").unwrap(), SequenceScope::PerDistrict);
        assert!(parse_sequence_scope("region").is_err());

        assert_eq!(parse_overlap_policy("smallest-area").unwrap(), OverlapPolicy::SmallestArea);
        assert_eq!(parse_overlap_policy("first").unwrap(), OverlapPolicy::StorageOrder);
        assert!(parse_overlap_policy("largest").is_err());

        assert_eq!(parse_area_projection("UTM").unwrap(), AreaProjection::LocalUtm);
        assert_eq!(parse_area_projection("epsg:3857").unwrap(), AreaProjection::WebMercator);
        assert!(parse_area_projection("albers").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert_eq!(map.len(), 7);
        let (prefix, source) = &map["code_prefix"];
        assert_eq!(prefix, "ES");
        assert_eq!(*source, ConfigSource::Default);
        assert_eq!(map["area_projection"].0, "LocalUtm");
    }
}
