//! Cross-cutting, shared constants.
//!
//! Every numeric policy knob of the pipeline has its default here. The sub-configs
//! (`MetadataConfig`, `VisualConfig`, `ResolverConfig`, ...) read these in their
//! `Default` impls, and `Config::from_env` overrides them at runtime.
//!
//! # Policy Orderings
//!
//! The absolute values are tunable. The relative orderings are what the resolver relies on:
//!
//! - [`DEFAULT_METADATA_CONFIDENCE`] > [`DEFAULT_TRUST_FLOOR`], so an intact GPS tag wins outright.
//! - [`DEFAULT_VISUAL_CONFIDENCE_CAP`] < [`DEFAULT_TRUST_FLOOR`], so a visual guess never
//!   outranks device GPS.
//! - [`DEFAULT_METADATA_UNCERTAINTY_METERS`] is far below [`DEFAULT_VISUAL_UNCERTAINTY_METERS`].

use std::time::Duration;

pub const DEFAULT_METADATA_CONFIDENCE: f64 = 0.95;
pub const DEFAULT_METADATA_UNCERTAINTY_METERS: f64 = 30.0;

pub const DEFAULT_VISUAL_CONFIDENCE_CAP: f64 = 0.7;
pub const DEFAULT_VISUAL_UNCERTAINTY_METERS: f64 = 25_000.0;
pub const DEFAULT_VISUAL_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_VISUAL_MAX_SIGNALS: usize = 3;
/// Predictions the model itself scores below this are discarded as noise.
pub const DEFAULT_VISUAL_MIN_CONFIDENCE: f64 = 0.1;

pub const DEFAULT_TRUST_FLOOR: f64 = 0.8;
pub const DEFAULT_DIVERGENCE_METERS: f64 = 25_000.0;
pub const DEFAULT_DISAGREEMENT_PENALTY: f64 = 0.5;

/// Geohash length used for geocoder cache cells. Length 7 is roughly a 150 m square.
pub const DEFAULT_GEOCODER_PRECISION: usize = 7;
pub const DEFAULT_GEOCODER_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_GEOCODER_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = concat!("geoverdict/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_RETRY_MAX_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_RETRY_MULTIPLIER: f64 = 2.0;

pub const DEFAULT_BREAKER_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_BREAKER_FAILURE_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_BREAKER_COOLDOWN: Duration = Duration::from_secs(30);

pub const DEFAULT_VERDICT_CACHE_CAPACITY: u64 = 100_000;
pub const DEFAULT_FAILED_TTL: Duration = Duration::from_secs(5 * 60);

/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;
