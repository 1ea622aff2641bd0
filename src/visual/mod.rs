//! Visual geolocation adapter.
//!
//! Wraps a black-box [`VisualModel`] and turns its raw predictions into
//! [`SignalSource::VisualModel`] signals: bounded in time, confidence clamped and capped,
//! uncertainty fixed, best first. A failing or slow model yields no signals.

pub mod config;
pub mod error;
pub mod http;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use config::VisualConfig;
pub use error::VisualModelError;
pub use http::HttpVisualModel;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockVisualModel;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::signal::{GeoSignal, SignalSource};

/// One raw location guess from the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualPrediction {
    pub latitude: f64,
    pub longitude: f64,
    /// The model's own certainty, nominally in `[0, 1]`.
    pub model_confidence: f64,
}

impl VisualPrediction {
    pub fn new(latitude: f64, longitude: f64, model_confidence: f64) -> Self {
        Self {
            latitude,
            longitude,
            model_confidence,
        }
    }
}

/// A visual geolocation capability.
#[async_trait]
pub trait VisualModel: Send + Sync {
    async fn infer(&self, image: &[u8]) -> Result<Vec<VisualPrediction>, VisualModelError>;
}

/// Normalizes [`VisualModel`] output into signals.
#[derive(Clone)]
pub struct VisualAdapter {
    model: Arc<dyn VisualModel>,
    config: VisualConfig,
}

impl std::fmt::Debug for VisualAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualAdapter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VisualAdapter {
    pub fn new(model: Arc<dyn VisualModel>, config: VisualConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &VisualConfig {
        &self.config
    }

    /// Runs the model and returns normalized signals, highest confidence first.
    ///
    /// Timeouts and model errors are logged at `warn` and produce an empty list.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn signals(&self, image: &[u8]) -> Vec<GeoSignal> {
        let start = Instant::now();

        let predictions =
            match tokio::time::timeout(self.config.timeout, self.model.infer(image)).await {
                Ok(Ok(predictions)) => predictions,
                Ok(Err(e)) => {
                    warn!(error = %e, "Visual inference failed; continuing without it");
                    return Vec::new();
                }
                Err(_) => {
                    let err = VisualModelError::Timeout {
                        timeout_ms: self.config.timeout.as_millis() as u64,
                    };
                    warn!(error = %err, "Visual inference timed out; continuing without it");
                    return Vec::new();
                }
            };

        let received = predictions.len();
        let mut signals: Vec<GeoSignal> = predictions
            .into_iter()
            .filter_map(|p| self.normalize(p))
            .collect();
        signals.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        signals.truncate(self.config.max_signals);

        debug!(
            received,
            kept = signals.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Visual inference completed"
        );
        signals
    }

    fn normalize(&self, prediction: VisualPrediction) -> Option<GeoSignal> {
        let raw = prediction.model_confidence;
        if !raw.is_finite() {
            debug!(confidence = raw, "Dropping prediction with non-finite confidence");
            return None;
        }

        let raw = raw.clamp(0.0, 1.0);
        if raw < self.config.min_confidence {
            return None;
        }

        let confidence = raw.min(self.config.confidence_cap);
        GeoSignal::new(
            SignalSource::VisualModel,
            prediction.latitude,
            prediction.longitude,
            self.config.uncertainty_meters,
            confidence,
        )
        .map_err(|e| debug!(error = %e, "Dropping invalid visual prediction"))
        .ok()
    }
}
