//! Reverse geocoding with caching and upstream protection.
//!
//! [`GeocoderClient::place_name`] never fails: cache miss, open circuit, exhausted retries
//! and timeouts all end in `None`. Lookups are cached per geohash cell, so nearby
//! coordinates share one upstream call.

pub mod breaker;
pub mod config;
pub mod error;
pub mod nominatim;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod tests;

pub use breaker::{BreakerState, CircuitBreaker};
pub use config::{BreakerConfig, GeocoderConfig, RetryConfig};
pub use error::GeocodeError;
pub use nominatim::NominatimGeocoder;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockGeocoder;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use backoff::future::retry_notify;
use moka::sync::Cache;
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use crate::geo::grid_key;

/// An upstream reverse-geocoding service.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// `Ok(None)` means the service answered but knows no place at that point.
    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<Option<String>, GeocodeError>;
}

/// Caching, retrying, circuit-breaking front of a [`ReverseGeocoder`].
pub struct GeocoderClient {
    upstream: Arc<dyn ReverseGeocoder>,
    config: GeocoderConfig,
    cache: Cache<String, Option<String>>,
    breaker: Mutex<CircuitBreaker>,
}

impl std::fmt::Debug for GeocoderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocoderClient")
            .field("config", &self.config)
            .field("cached_cells", &self.cache.entry_count())
            .field("breaker", &self.breaker.lock().state())
            .finish_non_exhaustive()
    }
}

impl GeocoderClient {
    pub fn new(upstream: Arc<dyn ReverseGeocoder>, config: GeocoderConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .build();
        let breaker = Mutex::new(CircuitBreaker::new(config.breaker));

        Self {
            upstream,
            config,
            cache,
            breaker,
        }
    }

    pub fn config(&self) -> &GeocoderConfig {
        &self.config
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.lock().state()
    }

    pub fn cached_cells(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Place name for the coordinate, or `None` when it cannot be determined right now.
    #[instrument(skip(self))]
    pub async fn place_name(&self, latitude: f64, longitude: f64) -> Option<String> {
        let key = grid_key(latitude, longitude, self.config.precision)?;

        if let Some(hit) = self.cache.get(&key) {
            debug!(cell = %key, "Geocoder cache hit");
            return hit;
        }

        if !self.breaker.lock().try_acquire(Instant::now()) {
            debug!(cell = %key, "Circuit open; skipping reverse geocoding");
            return None;
        }

        match self.lookup_with_retry(latitude, longitude).await {
            Ok(name) => {
                self.breaker.lock().record_success();
                self.cache.insert(key, name.clone());
                name
            }
            Err(e) => {
                self.breaker.lock().record_failure(Instant::now());
                warn!(error = %e, "Reverse geocoding failed; verdict will have no place name");
                None
            }
        }
    }

    async fn lookup_with_retry(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, GeocodeError> {
        let retry = &self.config.retry;
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(retry.initial_interval)
            .with_max_interval(retry.max_interval)
            .with_multiplier(retry.multiplier)
            .with_max_elapsed_time(None)
            .build();

        let attempts = AtomicU32::new(0);
        let max_attempts = retry.max_attempts.max(1);

        retry_notify(
            policy,
            || {
                let attempts = &attempts;
                async move {
                    let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    match self.attempt(latitude, longitude).await {
                        Ok(name) => Ok(name),
                        Err(e) if e.is_transient() && attempt < max_attempts => {
                            Err(backoff::Error::transient(e))
                        }
                        Err(e) => Err(backoff::Error::permanent(e)),
                    }
                }
            },
            |err: GeocodeError, after: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = after.as_millis() as u64,
                    "Geocoder retry scheduled"
                );
            },
        )
        .await
    }

    async fn attempt(&self, latitude: f64, longitude: f64) -> Result<Option<String>, GeocodeError> {
        match tokio::time::timeout(self.config.timeout, self.upstream.lookup(latitude, longitude))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(GeocodeError::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }),
        }
    }
}
