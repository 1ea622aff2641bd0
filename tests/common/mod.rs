//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use geoverdict::cache::VerdictStore;
use geoverdict::geocoder::{GeocoderConfig, MockGeocoder, RetryConfig};
use geoverdict::pipeline::{LocationPipeline, PipelineBuilder};
use geoverdict::visual::{MockVisualModel, VisualConfig, VisualPrediction};

/// Mocks wired into a pipeline, kept around so tests can count calls.
pub struct Harness {
    pub pipeline: LocationPipeline,
    pub visual: Arc<MockVisualModel>,
    pub geocoder: Arc<MockGeocoder>,
}

/// Builds a [`Harness`] step by step.
pub struct HarnessBuilder {
    visual: MockVisualModel,
    visual_config: VisualConfig,
    geocoder: MockGeocoder,
    geocoder_config: GeocoderConfig,
    store: Option<Arc<dyn VerdictStore>>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            visual: MockVisualModel::new(),
            visual_config: VisualConfig::default(),
            geocoder: MockGeocoder::empty(),
            geocoder_config: fast_geocoder_config(),
            store: None,
        }
    }
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visual(mut self, visual: MockVisualModel) -> Self {
        self.visual = visual;
        self
    }

    pub fn visual_predicts(self, predictions: Vec<VisualPrediction>) -> Self {
        self.visual(MockVisualModel::with_predictions(predictions))
    }

    pub fn visual_always_runs(mut self) -> Self {
        self.visual_config.always_run = true;
        self
    }

    pub fn geocoder(mut self, geocoder: MockGeocoder) -> Self {
        self.geocoder = geocoder;
        self
    }

    pub fn geocoder_timeout(mut self, timeout: Duration) -> Self {
        self.geocoder_config.timeout = timeout;
        self
    }

    pub fn store(mut self, store: Arc<dyn VerdictStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Harness {
        let visual = Arc::new(self.visual);
        let geocoder = Arc::new(self.geocoder);

        let mut builder: PipelineBuilder = LocationPipeline::builder()
            .visual_model(visual.clone(), self.visual_config)
            .geocoder(geocoder.clone(), self.geocoder_config);
        if let Some(store) = self.store {
            builder = builder.store(store);
        }

        Harness {
            pipeline: builder.build(),
            visual,
            geocoder,
        }
    }
}

/// Geocoder settings with short backoff so retry paths finish quickly.
pub fn fast_geocoder_config() -> GeocoderConfig {
    GeocoderConfig {
        timeout: Duration::from_millis(500),
        retry: RetryConfig {
            max_attempts: 2,
            initial_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(10),
            multiplier: 2.0,
        },
        ..GeocoderConfig::default()
    }
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} (±{tolerance}), got {actual}"
    );
}
