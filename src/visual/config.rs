use std::time::Duration;

use crate::constants::{
    DEFAULT_VISUAL_CONFIDENCE_CAP, DEFAULT_VISUAL_MAX_SIGNALS, DEFAULT_VISUAL_MIN_CONFIDENCE,
    DEFAULT_VISUAL_TIMEOUT, DEFAULT_VISUAL_UNCERTAINTY_METERS,
};

/// How visual predictions are bounded and normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualConfig {
    /// Upper bound on visual confidence. Default: `0.7`.
    pub confidence_cap: f64,

    /// Predictions scored below this by the model are dropped. Default: `0.1`.
    pub min_confidence: f64,

    /// Uncertainty assigned to every visual signal. Default: `25_000` meters.
    pub uncertainty_meters: f64,

    /// Hard bound on one `infer` call. Default: 10 s.
    pub timeout: Duration,

    /// Maximum signals kept per image, best first. Default: `3`.
    pub max_signals: usize,

    /// Run the model even when metadata already produced a signal. Default: `false`.
    pub always_run: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            confidence_cap: DEFAULT_VISUAL_CONFIDENCE_CAP,
            min_confidence: DEFAULT_VISUAL_MIN_CONFIDENCE,
            uncertainty_meters: DEFAULT_VISUAL_UNCERTAINTY_METERS,
            timeout: DEFAULT_VISUAL_TIMEOUT,
            max_signals: DEFAULT_VISUAL_MAX_SIGNALS,
            always_run: false,
        }
    }
}
