use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hashing::ImageFingerprint;
use crate::signal::GeoVerdict;

/// Lifecycle of one fingerprint in the gate.
///
/// `Pending -> Ready` on success, `Pending -> Failed` when no signal was available.
/// `Ready` and `Failed` are terminal; a `Failed` entry expires and the next request
/// starts a fresh resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryState {
    Pending,
    Ready { verdict: Arc<GeoVerdict> },
    Failed { reason: String },
}

impl EntryState {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryState::Pending => "pending",
            EntryState::Ready { .. } => "ready",
            EntryState::Failed { .. } => "failed",
        }
    }
}

/// What the gate (and a durable store) knows about a fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: ImageFingerprint,
    pub state: EntryState,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn pending(fingerprint: ImageFingerprint) -> Self {
        Self {
            fingerprint,
            state: EntryState::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn ready(verdict: Arc<GeoVerdict>) -> Self {
        Self {
            fingerprint: verdict.fingerprint,
            state: EntryState::Ready { verdict },
            created_at: Utc::now(),
        }
    }

    pub fn failed(fingerprint: ImageFingerprint, reason: impl Into<String>) -> Self {
        Self {
            fingerprint,
            state: EntryState::Failed {
                reason: reason.into(),
            },
            created_at: Utc::now(),
        }
    }

    pub fn verdict(&self) -> Option<&Arc<GeoVerdict>> {
        match &self.state {
            EntryState::Ready { verdict } => Some(verdict),
            _ => None,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, EntryState::Pending)
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, EntryState::Ready { .. })
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self.state, EntryState::Failed { .. })
    }
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
