//! Environment-backed configuration.
//!
//! Every setting has a default (see [`crate::constants`]). Override with `GEOVERDICT_*`
//! environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::constants::{DEFAULT_NOMINATIM_URL, DEFAULT_USER_AGENT};
use crate::geocoder::GeocoderConfig;
use crate::metadata::MetadataConfig;
use crate::resolver::ResolverConfig;
use crate::visual::VisualConfig;

/// Longest geohash the geocoder cache accepts.
const MAX_GEOHASH_PRECISION: usize = 12;

/// Pipeline configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `GEOVERDICT_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub metadata: MetadataConfig,

    pub visual: VisualConfig,

    /// Visual model endpoint. Unset disables visual inference.
    pub visual_url: Option<String>,

    pub resolver: ResolverConfig,

    pub geocoder: GeocoderConfig,

    /// Nominatim base URL. Empty disables reverse geocoding.
    pub geocoder_url: String,

    /// `User-Agent` sent to the geocoder.
    pub geocoder_user_agent: String,

    pub cache: CacheConfig,

    /// Directory of the file verdict store. Unset keeps verdicts in memory only.
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metadata: MetadataConfig::default(),
            visual: VisualConfig::default(),
            visual_url: None,
            resolver: ResolverConfig::default(),
            geocoder: GeocoderConfig::default(),
            geocoder_url: DEFAULT_NOMINATIM_URL.to_string(),
            geocoder_user_agent: DEFAULT_USER_AGENT.to_string(),
            cache: CacheConfig::default(),
            store_path: None,
        }
    }
}

impl Config {
    const ENV_TRUST_FLOOR: &'static str = "GEOVERDICT_TRUST_FLOOR";
    const ENV_DIVERGENCE_METERS: &'static str = "GEOVERDICT_DIVERGENCE_METERS";
    const ENV_DISAGREEMENT_PENALTY: &'static str = "GEOVERDICT_DISAGREEMENT_PENALTY";
    const ENV_METADATA_CONFIDENCE: &'static str = "GEOVERDICT_METADATA_CONFIDENCE";
    const ENV_METADATA_UNCERTAINTY: &'static str = "GEOVERDICT_METADATA_UNCERTAINTY_METERS";
    const ENV_VISUAL_URL: &'static str = "GEOVERDICT_VISUAL_URL";
    const ENV_VISUAL_TIMEOUT_MS: &'static str = "GEOVERDICT_VISUAL_TIMEOUT_MS";
    const ENV_VISUAL_CONFIDENCE_CAP: &'static str = "GEOVERDICT_VISUAL_CONFIDENCE_CAP";
    const ENV_VISUAL_MIN_CONFIDENCE: &'static str = "GEOVERDICT_VISUAL_MIN_CONFIDENCE";
    const ENV_VISUAL_UNCERTAINTY: &'static str = "GEOVERDICT_VISUAL_UNCERTAINTY_METERS";
    const ENV_VISUAL_MAX_SIGNALS: &'static str = "GEOVERDICT_VISUAL_MAX_SIGNALS";
    const ENV_VISUAL_ALWAYS_RUN: &'static str = "GEOVERDICT_VISUAL_ALWAYS_RUN";
    const ENV_GEOCODER_URL: &'static str = "GEOVERDICT_GEOCODER_URL";
    const ENV_GEOCODER_USER_AGENT: &'static str = "GEOVERDICT_GEOCODER_USER_AGENT";
    const ENV_GEOCODER_TIMEOUT_MS: &'static str = "GEOVERDICT_GEOCODER_TIMEOUT_MS";
    const ENV_GEOCODER_PRECISION: &'static str = "GEOVERDICT_GEOCODER_PRECISION";
    const ENV_GEOCODER_CACHE_CAPACITY: &'static str = "GEOVERDICT_GEOCODER_CACHE_CAPACITY";
    const ENV_RETRY_MAX_ATTEMPTS: &'static str = "GEOVERDICT_RETRY_MAX_ATTEMPTS";
    const ENV_RETRY_INITIAL_MS: &'static str = "GEOVERDICT_RETRY_INITIAL_MS";
    const ENV_RETRY_MAX_MS: &'static str = "GEOVERDICT_RETRY_MAX_MS";
    const ENV_BREAKER_FAILURES: &'static str = "GEOVERDICT_BREAKER_FAILURES";
    const ENV_BREAKER_WINDOW_SECS: &'static str = "GEOVERDICT_BREAKER_WINDOW_SECS";
    const ENV_BREAKER_COOLDOWN_SECS: &'static str = "GEOVERDICT_BREAKER_COOLDOWN_SECS";
    const ENV_CACHE_CAPACITY: &'static str = "GEOVERDICT_CACHE_CAPACITY";
    const ENV_CACHE_TTL_SECS: &'static str = "GEOVERDICT_CACHE_TTL_SECS";
    const ENV_FAILED_TTL_SECS: &'static str = "GEOVERDICT_FAILED_TTL_SECS";
    const ENV_STORE_PATH: &'static str = "GEOVERDICT_STORE_PATH";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// A variable that is set but unparsable is an error, not a silent default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();

        let metadata = MetadataConfig {
            confidence: Self::parse_from_env(Self::ENV_METADATA_CONFIDENCE, d.metadata.confidence)?,
            uncertainty_meters: Self::parse_from_env(
                Self::ENV_METADATA_UNCERTAINTY,
                d.metadata.uncertainty_meters,
            )?,
        };

        let visual = VisualConfig {
            confidence_cap: Self::parse_from_env(
                Self::ENV_VISUAL_CONFIDENCE_CAP,
                d.visual.confidence_cap,
            )?,
            min_confidence: Self::parse_from_env(
                Self::ENV_VISUAL_MIN_CONFIDENCE,
                d.visual.min_confidence,
            )?,
            uncertainty_meters: Self::parse_from_env(
                Self::ENV_VISUAL_UNCERTAINTY,
                d.visual.uncertainty_meters,
            )?,
            timeout: Self::parse_millis_from_env(Self::ENV_VISUAL_TIMEOUT_MS, d.visual.timeout)?,
            max_signals: Self::parse_from_env(Self::ENV_VISUAL_MAX_SIGNALS, d.visual.max_signals)?,
            always_run: Self::parse_bool_from_env(
                Self::ENV_VISUAL_ALWAYS_RUN,
                d.visual.always_run,
            )?,
        };

        let resolver = ResolverConfig {
            trust_floor: Self::parse_from_env(Self::ENV_TRUST_FLOOR, d.resolver.trust_floor)?,
            divergence_meters: Self::parse_from_env(
                Self::ENV_DIVERGENCE_METERS,
                d.resolver.divergence_meters,
            )?,
            disagreement_penalty: Self::parse_from_env(
                Self::ENV_DISAGREEMENT_PENALTY,
                d.resolver.disagreement_penalty,
            )?,
        };

        let mut geocoder = d.geocoder.clone();
        geocoder.timeout =
            Self::parse_millis_from_env(Self::ENV_GEOCODER_TIMEOUT_MS, geocoder.timeout)?;
        geocoder.precision = Self::parse_from_env(Self::ENV_GEOCODER_PRECISION, geocoder.precision)?;
        geocoder.cache_capacity =
            Self::parse_from_env(Self::ENV_GEOCODER_CACHE_CAPACITY, geocoder.cache_capacity)?;
        geocoder.retry.max_attempts =
            Self::parse_from_env(Self::ENV_RETRY_MAX_ATTEMPTS, geocoder.retry.max_attempts)?;
        geocoder.retry.initial_interval =
            Self::parse_millis_from_env(Self::ENV_RETRY_INITIAL_MS, geocoder.retry.initial_interval)?;
        geocoder.retry.max_interval =
            Self::parse_millis_from_env(Self::ENV_RETRY_MAX_MS, geocoder.retry.max_interval)?;
        geocoder.breaker.failure_threshold = Self::parse_from_env(
            Self::ENV_BREAKER_FAILURES,
            geocoder.breaker.failure_threshold,
        )?;
        geocoder.breaker.failure_window = Self::parse_secs_from_env(
            Self::ENV_BREAKER_WINDOW_SECS,
            geocoder.breaker.failure_window,
        )?;
        geocoder.breaker.cooldown =
            Self::parse_secs_from_env(Self::ENV_BREAKER_COOLDOWN_SECS, geocoder.breaker.cooldown)?;

        let cache = CacheConfig {
            capacity: Self::parse_from_env(Self::ENV_CACHE_CAPACITY, d.cache.capacity)?,
            ready_ttl: Self::parse_optional_secs_from_env(Self::ENV_CACHE_TTL_SECS)?,
            failed_ttl: Self::parse_secs_from_env(Self::ENV_FAILED_TTL_SECS, d.cache.failed_ttl)?,
        };

        Ok(Self {
            metadata,
            visual,
            visual_url: Self::parse_optional_string_from_env(Self::ENV_VISUAL_URL),
            resolver,
            geocoder,
            geocoder_url: Self::parse_string_from_env(Self::ENV_GEOCODER_URL, d.geocoder_url),
            geocoder_user_agent: Self::parse_string_from_env(
                Self::ENV_GEOCODER_USER_AGENT,
                d.geocoder_user_agent,
            ),
            cache,
            store_path: Self::parse_optional_path_from_env(Self::ENV_STORE_PATH),
        })
    }

    /// Checks ranges and paths (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit(Self::ENV_METADATA_CONFIDENCE, self.metadata.confidence)?;
        check_unit(Self::ENV_VISUAL_CONFIDENCE_CAP, self.visual.confidence_cap)?;
        check_unit(Self::ENV_VISUAL_MIN_CONFIDENCE, self.visual.min_confidence)?;
        check_unit(Self::ENV_TRUST_FLOOR, self.resolver.trust_floor)?;
        check_unit(Self::ENV_DISAGREEMENT_PENALTY, self.resolver.disagreement_penalty)?;

        check_non_negative(Self::ENV_METADATA_UNCERTAINTY, self.metadata.uncertainty_meters)?;
        check_non_negative(Self::ENV_VISUAL_UNCERTAINTY, self.visual.uncertainty_meters)?;
        check_non_negative(Self::ENV_DIVERGENCE_METERS, self.resolver.divergence_meters)?;

        check(
            Self::ENV_VISUAL_MAX_SIGNALS,
            self.visual.max_signals,
            self.visual.max_signals >= 1,
            "at least 1",
        )?;
        check(
            Self::ENV_GEOCODER_PRECISION,
            self.geocoder.precision,
            (1..=MAX_GEOHASH_PRECISION).contains(&self.geocoder.precision),
            "between 1 and 12",
        )?;
        check(
            Self::ENV_RETRY_MAX_ATTEMPTS,
            self.geocoder.retry.max_attempts,
            self.geocoder.retry.max_attempts >= 1,
            "at least 1",
        )?;
        check(
            Self::ENV_RETRY_MAX_MS,
            self.geocoder.retry.max_interval.as_millis(),
            self.geocoder.retry.max_interval >= self.geocoder.retry.initial_interval,
            "not below the initial retry interval",
        )?;
        check(
            "retry multiplier",
            self.geocoder.retry.multiplier,
            self.geocoder.retry.multiplier.is_finite() && self.geocoder.retry.multiplier >= 1.0,
            "at least 1.0",
        )?;
        check(
            Self::ENV_BREAKER_FAILURES,
            self.geocoder.breaker.failure_threshold,
            self.geocoder.breaker.failure_threshold >= 1,
            "at least 1",
        )?;
        check_positive_duration(Self::ENV_VISUAL_TIMEOUT_MS, self.visual.timeout)?;
        check_positive_duration(Self::ENV_GEOCODER_TIMEOUT_MS, self.geocoder.timeout)?;
        check(
            Self::ENV_CACHE_CAPACITY,
            self.cache.capacity,
            self.cache.capacity >= 1,
            "at least 1",
        )?;

        if let Some(ref path) = self.store_path
            && path.exists()
            && !path.is_dir()
        {
            return Err(ConfigError::NotADirectory { path: path.clone() });
        }

        Ok(())
    }

    fn parse_from_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match env::var(name) {
            Ok(value) if !value.trim().is_empty() => {
                value
                    .trim()
                    .parse()
                    .map_err(|e: T::Err| ConfigError::InvalidValue {
                        name,
                        reason: e.to_string(),
                        value,
                    })
            }
            _ => Ok(default),
        }
    }

    fn parse_millis_from_env(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        Self::parse_from_env(name, default.as_millis() as u64).map(Duration::from_millis)
    }

    fn parse_secs_from_env(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        Self::parse_from_env(name, default.as_secs()).map(Duration::from_secs)
    }

    fn parse_optional_secs_from_env(name: &'static str) -> Result<Option<Duration>, ConfigError> {
        match Self::parse_optional_string_from_env(name) {
            Some(value) => value
                .parse::<u64>()
                .map(|secs| Some(Duration::from_secs(secs)))
                .map_err(|e| ConfigError::InvalidValue {
                    name,
                    reason: e.to_string(),
                    value,
                }),
            None => Ok(None),
        }
    }

    fn parse_bool_from_env(name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match Self::parse_optional_string_from_env(name) {
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    name,
                    value,
                    reason: "expected a boolean".to_string(),
                }),
            },
            None => Ok(default),
        }
    }

    fn parse_optional_string_from_env(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_optional_path_from_env(name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(name).map(PathBuf::from)
    }

    fn parse_string_from_env(name: &str, default: String) -> String {
        env::var(name).map(|v| v.trim().to_string()).unwrap_or(default)
    }
}

fn check<T: Display>(
    name: &'static str,
    value: T,
    ok: bool,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value: value.to_string(),
            expected,
        })
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    check(
        name,
        value,
        value.is_finite() && (0.0..=1.0).contains(&value),
        "a value in [0, 1]",
    )
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    check(
        name,
        value,
        value.is_finite() && value >= 0.0,
        "a finite value >= 0",
    )
}

fn check_positive_duration(name: &'static str, value: Duration) -> Result<(), ConfigError> {
    check(name, value.as_millis(), !value.is_zero(), "greater than zero")
}
