//! Verdict cache and per-fingerprint deduplication.

pub mod config;
pub mod error;
pub mod gate;
pub mod stats;
pub mod store;
pub mod types;


pub use config::CacheConfig;
pub use error::{StoreError, StoreResult};
pub use gate::ResolutionGate;
pub use stats::{GateStats, GateStatsSnapshot};
pub use store::{FileVerdictStore, MemoryVerdictStore, VerdictStore};
pub use types::{CacheEntry, EntryState};
