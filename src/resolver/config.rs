use crate::constants::{
    DEFAULT_DISAGREEMENT_PENALTY, DEFAULT_DIVERGENCE_METERS, DEFAULT_TRUST_FLOOR,
};

/// Merge policy between metadata and visual signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    /// Metadata confidence strictly above this wins outright. Default: `0.8`.
    pub trust_floor: f64,

    /// Distance beyond which two signals are considered in conflict. Default: `25_000` m.
    pub divergence_meters: f64,

    /// Factor in `[0, 1]` applied to merged confidence on conflict. Default: `0.5`.
    pub disagreement_penalty: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            trust_floor: DEFAULT_TRUST_FLOOR,
            divergence_meters: DEFAULT_DIVERGENCE_METERS,
            disagreement_penalty: DEFAULT_DISAGREEMENT_PENALTY,
        }
    }
}
