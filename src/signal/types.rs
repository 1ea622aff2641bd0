use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::is_valid_coordinate;
use crate::hashing::ImageFingerprint;

/// Where a signal came from. The resolver switches on the set of sources present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// Embedded GPS tag (device-reported).
    Metadata,
    /// Visual geolocation model.
    VisualModel,
}

impl SignalSource {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSource::Metadata => "metadata",
            SignalSource::VisualModel => "visual_model",
        }
    }
}

impl std::fmt::Display for SignalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected signal construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidSignal {
    #[error("coordinate out of range: ({latitude}, {longitude})")]
    Coordinate { latitude: f64, longitude: f64 },

    #[error("confidence must be a finite value in [0, 1], got {value}")]
    Confidence { value: f64 },

    #[error("uncertainty must be a finite non-negative value, got {value}")]
    Uncertainty { value: f64 },
}

/// One candidate location observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSignal {
    pub source: SignalSource,
    pub latitude: f64,
    pub longitude: f64,
    pub uncertainty_meters: f64,
    pub confidence: f64,
}

impl GeoSignal {
    /// Builds a signal, rejecting out-of-range coordinates, confidence or uncertainty.
    pub fn new(
        source: SignalSource,
        latitude: f64,
        longitude: f64,
        uncertainty_meters: f64,
        confidence: f64,
    ) -> Result<Self, InvalidSignal> {
        if !is_valid_coordinate(latitude, longitude) {
            return Err(InvalidSignal::Coordinate {
                latitude,
                longitude,
            });
        }
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(InvalidSignal::Confidence { value: confidence });
        }
        if !uncertainty_meters.is_finite() || uncertainty_meters < 0.0 {
            return Err(InvalidSignal::Uncertainty {
                value: uncertainty_meters,
            });
        }
        Ok(Self {
            source,
            latitude,
            longitude,
            uncertainty_meters,
            confidence,
        })
    }

    #[inline]
    pub fn coordinate(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Re-checks the invariants [`GeoSignal::new`] enforces. Fields are public, so
    /// the resolver calls this before trusting a signal.
    pub fn is_well_formed(&self) -> bool {
        is_valid_coordinate(self.latitude, self.longitude)
            && self.confidence.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
            && self.uncertainty_meters.is_finite()
            && self.uncertainty_meters >= 0.0
    }
}

/// The resolved, published answer for one fingerprint.
///
/// Built once by the pipeline and then only shared (behind `Arc`) and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoVerdict {
    pub fingerprint: ImageFingerprint,
    pub latitude: f64,
    pub longitude: f64,
    pub uncertainty_meters: f64,
    pub confidence: f64,
    pub place_name: Option<String>,
    pub resolved_at: DateTime<Utc>,
    /// Signals that contributed to the answer, metadata first.
    pub source_signals: Vec<GeoSignal>,
}

impl GeoVerdict {
    #[inline]
    pub fn coordinate(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Returns `true` if any contributing signal came from `source`.
    pub fn has_source(&self, source: SignalSource) -> bool {
        self.source_signals.iter().any(|s| s.source == source)
    }

    pub fn count_source(&self, source: SignalSource) -> usize {
        self.source_signals
            .iter()
            .filter(|s| s.source == source)
            .count()
    }
}
