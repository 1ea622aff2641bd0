//! Signal resolution.
//!
//! Picks one location out of the candidate signals:
//!
//! 1. One source present: adopt its best signal.
//! 2. Both present and metadata confidence above the trust floor: metadata wins outright.
//! 3. Otherwise: confidence-weighted average of the two best signals. The merged
//!    confidence is the higher input confidence, penalized when the inputs are further
//!    apart than the divergence threshold. The merged uncertainty is never below either
//!    input's uncertainty, and on conflict never below the distance between them.

pub mod config;

#[cfg(test)]
mod tests;

pub use config::ResolverConfig;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::geo::{haversine_meters, normalize_longitude};
use crate::signal::{GeoSignal, SignalSource};

/// Which branch of the resolution rules produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergeStrategy {
    SingleSource { source: SignalSource },
    MetadataPreferred,
    WeightedMerge { distance_meters: f64, diverged: bool },
}

/// The resolver's answer, before the pipeline adds fingerprint, place name and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub latitude: f64,
    pub longitude: f64,
    pub uncertainty_meters: f64,
    pub confidence: f64,
    pub strategy: MergeStrategy,
    /// Contributing signals, metadata first.
    pub source_signals: Vec<GeoSignal>,
}

impl Resolution {
    fn adopt(signal: &GeoSignal, strategy: MergeStrategy) -> Self {
        Self {
            latitude: signal.latitude,
            longitude: signal.longitude,
            uncertainty_meters: signal.uncertainty_meters,
            confidence: signal.confidence,
            strategy,
            source_signals: vec![signal.clone()],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalResolver {
    config: ResolverConfig,
}

impl SignalResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Combines `signals` into one location, or fails with
    /// [`ResolveError::NoSignalAvailable`] when none is usable.
    pub fn resolve(&self, signals: &[GeoSignal]) -> ResolveResult<Resolution> {
        let usable = signals.iter().filter(|s| {
            let ok = s.is_well_formed();
            if !ok {
                debug!(source = %s.source, "Discarding malformed signal");
            }
            ok
        });

        let mut metadata: Option<&GeoSignal> = None;
        let mut visual: Option<&GeoSignal> = None;
        for signal in usable {
            let slot = match signal.source {
                SignalSource::Metadata => &mut metadata,
                SignalSource::VisualModel => &mut visual,
            };
            if slot.is_none_or(|best| signal.confidence > best.confidence) {
                *slot = Some(signal);
            }
        }

        let resolution = match (metadata, visual) {
            (None, None) => return Err(ResolveError::NoSignalAvailable),
            (Some(only), None) | (None, Some(only)) => Resolution::adopt(
                only,
                MergeStrategy::SingleSource {
                    source: only.source,
                },
            ),
            (Some(m), Some(_)) if m.confidence > self.config.trust_floor => {
                Resolution::adopt(m, MergeStrategy::MetadataPreferred)
            }
            (Some(m), Some(v)) => self.merge(m, v),
        };

        debug!(
            strategy = ?resolution.strategy,
            confidence = resolution.confidence,
            uncertainty_meters = resolution.uncertainty_meters,
            "Signals resolved"
        );
        Ok(resolution)
    }

    fn merge(&self, metadata: &GeoSignal, visual: &GeoSignal) -> Resolution {
        let (wm, wv) = match metadata.confidence + visual.confidence {
            total if total > 0.0 => (metadata.confidence / total, visual.confidence / total),
            _ => (0.5, 0.5),
        };

        // Average on the short side of the antimeridian.
        let mut visual_lon = visual.longitude;
        if visual_lon - metadata.longitude > 180.0 {
            visual_lon -= 360.0;
        } else if visual_lon - metadata.longitude < -180.0 {
            visual_lon += 360.0;
        }

        let latitude = metadata.latitude * wm + visual.latitude * wv;
        let longitude = normalize_longitude(metadata.longitude * wm + visual_lon * wv);

        let distance = haversine_meters(metadata.coordinate(), visual.coordinate());
        let diverged = distance > self.config.divergence_meters;

        let mut confidence = metadata.confidence.max(visual.confidence);
        let mut uncertainty = metadata.uncertainty_meters.max(visual.uncertainty_meters);
        if diverged {
            confidence *= self.config.disagreement_penalty;
            uncertainty = uncertainty.max(distance);
        }

        Resolution {
            latitude,
            longitude,
            uncertainty_meters: uncertainty,
            confidence: confidence.clamp(0.0, 1.0),
            strategy: MergeStrategy::WeightedMerge {
                distance_meters: distance,
                diverged,
            },
            source_signals: vec![metadata.clone(), visual.clone()],
        }
    }
}
