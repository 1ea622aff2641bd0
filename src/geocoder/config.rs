use std::time::Duration;

use crate::constants::{
    DEFAULT_BREAKER_COOLDOWN, DEFAULT_BREAKER_FAILURE_THRESHOLD, DEFAULT_BREAKER_FAILURE_WINDOW,
    DEFAULT_GEOCODER_CACHE_CAPACITY, DEFAULT_GEOCODER_PRECISION, DEFAULT_GEOCODER_TIMEOUT,
    DEFAULT_RETRY_INITIAL_INTERVAL, DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_INTERVAL,
    DEFAULT_RETRY_MULTIPLIER,
};

/// Exponential backoff bounds for upstream lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Total attempts per lookup, including the first. Default: `3`.
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            initial_interval: DEFAULT_RETRY_INITIAL_INTERVAL,
            max_interval: DEFAULT_RETRY_MAX_INTERVAL,
            multiplier: DEFAULT_RETRY_MULTIPLIER,
        }
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Failures within `failure_window` that open the circuit. Default: `5`.
    pub failure_threshold: u32,
    /// Default: 60 s.
    pub failure_window: Duration,
    /// Time the circuit stays open before a probe is allowed. Default: 30 s.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_BREAKER_FAILURE_THRESHOLD,
            failure_window: DEFAULT_BREAKER_FAILURE_WINDOW,
            cooldown: DEFAULT_BREAKER_COOLDOWN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocoderConfig {
    /// Geohash length of cache cells. Default: `7` (~150 m).
    pub precision: usize,
    /// Max cached cells. Default: `10_000`.
    pub cache_capacity: u64,
    /// Per-attempt timeout. Default: 5 s.
    pub timeout: Duration,
    pub retry: RetryConfig,
    pub breaker: BreakerConfig,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_GEOCODER_PRECISION,
            cache_capacity: DEFAULT_GEOCODER_CACHE_CAPACITY,
            timeout: DEFAULT_GEOCODER_TIMEOUT,
            retry: RetryConfig::default(),
            breaker: BreakerConfig::default(),
        }
    }
}
