//! The location resolution pipeline.
//!
//! `resolve(image)` fingerprints the bytes and goes through the [`ResolutionGate`]. Only
//! the leader for a fingerprint runs the sources, in order:
//!
//! 1. metadata extraction,
//! 2. visual inference, when metadata gave nothing or `always_run` is set,
//! 3. signal resolution,
//! 4. reverse geocoding of the resolved coordinate.
//!
//! The verdict is fully built before it is handed to the gate for publication.

pub mod error;

pub use error::PipelineError;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::cache::{
    CacheConfig, FileVerdictStore, GateStatsSnapshot, ResolutionGate, VerdictStore,
};
use crate::config::Config;
use crate::error::ResolveResult;
use crate::geocoder::{GeocoderClient, GeocoderConfig, NominatimGeocoder, ReverseGeocoder};
use crate::hashing::ImageFingerprint;
use crate::metadata::{MetadataConfig, MetadataExtractor};
use crate::resolver::{ResolverConfig, SignalResolver};
use crate::signal::GeoVerdict;
use crate::visual::{HttpVisualModel, VisualAdapter, VisualConfig, VisualModel};

struct Sources {
    metadata: MetadataExtractor,
    visual: Option<VisualAdapter>,
    resolver: SignalResolver,
    geocoder: Option<GeocoderClient>,
}

impl Sources {
    async fn run(&self, fingerprint: ImageFingerprint, image: &[u8]) -> ResolveResult<GeoVerdict> {
        let start = Instant::now();
        let mut signals = Vec::new();

        let metadata = self.metadata.extract(image);
        let has_metadata = metadata.is_some();
        signals.extend(metadata);

        match &self.visual {
            Some(visual) if !has_metadata || visual.config().always_run => {
                signals.extend(visual.signals(image).await);
            }
            Some(_) => debug!("GPS metadata present; skipping visual inference"),
            None => debug!("No visual model configured"),
        }

        let resolution = self.resolver.resolve(&signals).inspect_err(|e| {
            info!(
                fingerprint = %fingerprint.short(),
                error = %e,
                "Could not determine location"
            );
        })?;

        let place_name = match &self.geocoder {
            Some(geocoder) => {
                geocoder
                    .place_name(resolution.latitude, resolution.longitude)
                    .await
            }
            None => None,
        };

        let verdict = GeoVerdict {
            fingerprint,
            latitude: resolution.latitude,
            longitude: resolution.longitude,
            uncertainty_meters: resolution.uncertainty_meters,
            confidence: resolution.confidence,
            place_name,
            resolved_at: Utc::now(),
            source_signals: resolution.source_signals,
        };

        info!(
            fingerprint = %fingerprint.short(),
            latitude = verdict.latitude,
            longitude = verdict.longitude,
            confidence = verdict.confidence,
            uncertainty_meters = verdict.uncertainty_meters,
            strategy = ?resolution.strategy,
            place = verdict.place_name.as_deref().unwrap_or("-"),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Location resolved"
        );
        Ok(verdict)
    }
}

/// Entry point for resolving image locations. Cheap to clone.
#[derive(Clone)]
pub struct LocationPipeline {
    sources: Arc<Sources>,
    gate: ResolutionGate,
}

impl std::fmt::Debug for LocationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationPipeline")
            .field("visual", &self.sources.visual.is_some())
            .field("geocoder", &self.sources.geocoder.is_some())
            .field("gate", &self.gate)
            .finish()
    }
}

impl LocationPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Assembles a pipeline with HTTP collaborators as configured.
    ///
    /// The visual model is attached only when `visual_url` is set, the geocoder only when
    /// `geocoder_url` is non-empty, and the file store only when `store_path` is set.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        config.validate()?;

        let mut builder = Self::builder()
            .metadata(config.metadata)
            .resolver(config.resolver)
            .cache(config.cache);

        if let Some(url) = &config.visual_url {
            let model = HttpVisualModel::new(url.clone(), config.visual.timeout)?;
            builder = builder.visual_model(Arc::new(model), config.visual.clone());
        }

        if !config.geocoder_url.trim().is_empty() {
            let upstream = NominatimGeocoder::new(
                config.geocoder_url.clone(),
                &config.geocoder_user_agent,
                config.geocoder.timeout,
            )?;
            builder = builder.geocoder(Arc::new(upstream), config.geocoder.clone());
        }

        if let Some(path) = &config.store_path {
            builder = builder.store(Arc::new(FileVerdictStore::open(path)?));
        }

        Ok(builder.build())
    }

    /// Resolves where `image` was taken.
    ///
    /// Identical bytes share one resolution: concurrent callers wait on the same work, and
    /// later callers get the cached verdict. Fails only with
    /// [`crate::ResolveError::NoSignalAvailable`], or `Aborted` if the resolution died.
    #[instrument(
        skip(self, image),
        fields(request_id = %Uuid::new_v4(), fingerprint = tracing::field::Empty, bytes = image.len())
    )]
    pub async fn resolve(&self, image: &[u8]) -> ResolveResult<Arc<GeoVerdict>> {
        let fingerprint = ImageFingerprint::of(image);
        tracing::Span::current().record("fingerprint", fingerprint.short().as_str());

        let sources = Arc::clone(&self.sources);
        self.gate
            .get_or_resolve(fingerprint, move || {
                let image = image.to_vec();
                async move { sources.run(fingerprint, &image).await }
            })
            .await
    }

    /// Resolves several images concurrently. Results are in input order.
    pub async fn resolve_batch<T>(&self, images: &[T]) -> Vec<ResolveResult<Arc<GeoVerdict>>>
    where
        T: AsRef<[u8]>,
    {
        join_all(images.iter().map(|image| self.resolve(image.as_ref()))).await
    }

    pub fn gate(&self) -> &ResolutionGate {
        &self.gate
    }

    /// Forgets every verdict held in memory. A configured store still answers for
    /// verdicts it holds.
    pub fn clear_cache(&self) {
        self.gate.invalidate_all();
    }

    pub fn stats(&self) -> GateStatsSnapshot {
        self.gate.stats()
    }
}

/// Step-by-step construction of a [`LocationPipeline`].
///
/// Only metadata extraction and resolution are always present; the visual model,
/// geocoder and durable store are opt-in.
#[derive(Default)]
pub struct PipelineBuilder {
    metadata: MetadataConfig,
    visual: Option<(Arc<dyn VisualModel>, VisualConfig)>,
    resolver: ResolverConfig,
    geocoder: Option<(Arc<dyn ReverseGeocoder>, GeocoderConfig)>,
    cache: CacheConfig,
    store: Option<Arc<dyn VerdictStore>>,
}

impl PipelineBuilder {
    pub fn metadata(mut self, config: MetadataConfig) -> Self {
        self.metadata = config;
        self
    }

    pub fn visual_model(mut self, model: Arc<dyn VisualModel>, config: VisualConfig) -> Self {
        self.visual = Some((model, config));
        self
    }

    pub fn resolver(mut self, config: ResolverConfig) -> Self {
        self.resolver = config;
        self
    }

    pub fn geocoder(mut self, upstream: Arc<dyn ReverseGeocoder>, config: GeocoderConfig) -> Self {
        self.geocoder = Some((upstream, config));
        self
    }

    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn VerdictStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> LocationPipeline {
        let sources = Sources {
            metadata: MetadataExtractor::new(self.metadata),
            visual: self
                .visual
                .map(|(model, config)| VisualAdapter::new(model, config)),
            resolver: SignalResolver::new(self.resolver),
            geocoder: self
                .geocoder
                .map(|(upstream, config)| GeocoderClient::new(upstream, config)),
        };

        let gate = match self.store {
            Some(store) => ResolutionGate::with_store(self.cache, store),
            None => ResolutionGate::new(self.cache),
        };

        LocationPipeline {
            sources: Arc::new(sources),
            gate,
        }
    }
}
