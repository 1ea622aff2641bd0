use crate::constants::{DEFAULT_METADATA_CONFIDENCE, DEFAULT_METADATA_UNCERTAINTY_METERS};

/// Trust assigned to an embedded GPS tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetadataConfig {
    /// Confidence of a well-formed tag. Default: `0.95`.
    pub confidence: f64,
    /// Fixed uncertainty reflecting GPS sensor precision. Default: `30` meters.
    pub uncertainty_meters: f64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_METADATA_CONFIDENCE,
            uncertainty_meters: DEFAULT_METADATA_UNCERTAINTY_METERS,
        }
    }
}
