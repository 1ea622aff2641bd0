//! Geoverdict library crate (used by the CLI and integration tests).
//!
//! # Public API Surface
//!
//! ## Core Types (Stable)
//! - [`LocationPipeline`], [`PipelineBuilder`] - Resolve where an image was taken
//! - [`GeoVerdict`], [`GeoSignal`], [`SignalSource`] - Published answers and their inputs
//! - [`ResolveError`] - The only failures a caller sees
//! - [`Config`], [`ConfigError`] - Environment-driven configuration
//!
//! ## Sources
//! - [`MetadataExtractor`] - EXIF GPS reading
//! - [`VisualAdapter`], [`VisualModel`], [`HttpVisualModel`] - Visual inference
//! - [`SignalResolver`] - Merging signals into one coordinate
//! - [`GeocoderClient`], [`ReverseGeocoder`], [`NominatimGeocoder`] - Place names
//!
//! ## Cache
//! - [`ResolutionGate`] - Per-fingerprint dedup and verdict cache
//! - [`VerdictStore`], [`FileVerdictStore`], [`MemoryVerdictStore`] - Durable verdicts
//! - [`ImageFingerprint`] - Content identity of an image
//!
//! ## Test/Mock Support
//! Mock implementations and JPEG fixtures are available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod geo;
pub mod geocoder;
pub mod hashing;
pub mod metadata;
pub mod pipeline;
pub mod resolver;
pub mod signal;
pub mod visual;

pub use cache::{
    CacheConfig, CacheEntry, EntryState, FileVerdictStore, GateStatsSnapshot, MemoryVerdictStore,
    ResolutionGate, StoreError, VerdictStore,
};
pub use config::{Config, ConfigError};
pub use error::{ResolveError, ResolveResult};
pub use geo::{grid_key, haversine_meters};
pub use geocoder::{
    BreakerConfig, BreakerState, GeocodeError, GeocoderClient, GeocoderConfig, NominatimGeocoder,
    RetryConfig, ReverseGeocoder,
};
pub use hashing::ImageFingerprint;
pub use metadata::{MetadataConfig, MetadataError, MetadataExtractor};
pub use pipeline::{LocationPipeline, PipelineBuilder, PipelineError};
pub use resolver::{MergeStrategy, Resolution, ResolverConfig, SignalResolver};
pub use signal::{GeoSignal, GeoVerdict, SignalSource};
pub use visual::{
    HttpVisualModel, VisualAdapter, VisualConfig, VisualModel, VisualModelError, VisualPrediction,
};

#[cfg(any(test, feature = "mock"))]
pub use geocoder::MockGeocoder;
#[cfg(any(test, feature = "mock"))]
pub use visual::MockVisualModel;
