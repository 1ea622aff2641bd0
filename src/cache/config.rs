use std::time::Duration;

use crate::constants::{DEFAULT_FAILED_TTL, DEFAULT_VERDICT_CACHE_CAPACITY};

/// Retention policy of settled entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Max settled entries (`Ready` and `Failed`). Default: `100_000`.
    pub capacity: u64,

    /// Lifetime of `Ready` entries. `None` keeps them until evicted for capacity.
    pub ready_ttl: Option<Duration>,

    /// Lifetime of `Failed` entries. Default: 5 minutes.
    pub failed_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_VERDICT_CACHE_CAPACITY,
            ready_ttl: None,
            failed_ttl: DEFAULT_FAILED_TTL,
        }
    }
}
