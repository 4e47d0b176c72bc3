//! Error types for farmgeo

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FarmgeoError {
    // Geometry errors
    #[error("Invalid geometry in {field}: {reason}")]
    InvalidGeometry { field: String, reason: String },

    #[error("Region resolution degraded: {reason}")]
    RegionResolutionDegraded { reason: String },

    #[error("Area computation failed: {reason}")]
    AreaComputationFailed { reason: String },

    // Farm code errors
    #[error("Farm code {code} is already assigned")]
    DuplicateFarmCode { code: String },

    #[error("Could not allocate a unique farm code after {attempts} attempts")]
    CodeAllocationExhausted { attempts: u32 },

    // Lookup errors
    #[error("Farm not found: {id}")]
    FarmNotFound { id: u64 },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FarmgeoError {
    /// Shorthand for an [`FarmgeoError::InvalidGeometry`] naming the offending input field
    pub fn invalid_geometry(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry { field: field.into(), reason: reason.into() }
    }

    /// Whether the operation can be retried with freshly derived inputs
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DuplicateFarmCode { .. })
    }
}

pub type Result<T> = std::result::Result<T, FarmgeoError>;
