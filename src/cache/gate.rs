//! The deduplicating resolution gate.
//!
//! Holds the only shared mutable state of the pipeline:
//!
//! - `settled`: terminal entries (`Ready`, `Failed`) in a bounded moka cache. `Failed`
//!   entries expire after `failed_ttl`; `Ready` entries after `ready_ttl`, if set. The
//!   same TTL applies to verdicts read back from the store.
//! - `in_flight`: one `watch` channel per fingerprint being resolved. Its presence is the
//!   `Pending` state.
//!
//! A request for a fingerprint that is in flight subscribes to the existing channel
//! instead of starting work, so at most one resolution runs per fingerprint. The work
//! itself runs in a spawned task: a caller that stops waiting does not cancel it.
//!
//! Publication order is settled insert, then channel send, then in-flight removal. A
//! request arriving at any point in between sees either the settled entry or a channel
//! that already carries the outcome.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::FutureExt;
use moka::Expiry;
use moka::sync::Cache;
use tokio::sync::watch;
use tracing::{Instrument, Span, debug, error, warn};

use super::config::CacheConfig;
use super::stats::{GateStats, GateStatsSnapshot};
use super::store::VerdictStore;
use super::types::{CacheEntry, EntryState};
use crate::error::{ResolveError, ResolveResult};
use crate::hashing::ImageFingerprint;
use crate::signal::GeoVerdict;

type Outcome = ResolveResult<Arc<GeoVerdict>>;
type OutcomeRx = watch::Receiver<Option<Outcome>>;

struct SettledExpiry {
    ready_ttl: Option<Duration>,
    failed_ttl: Duration,
}

impl SettledExpiry {
    fn ttl(&self, entry: &CacheEntry) -> Option<Duration> {
        match entry.state {
            EntryState::Ready { .. } => self.ready_ttl,
            EntryState::Failed { .. } => Some(self.failed_ttl),
            EntryState::Pending => Some(Duration::ZERO),
        }
    }
}

impl Expiry<ImageFingerprint, CacheEntry> for SettledExpiry {
    fn expire_after_create(
        &self,
        _key: &ImageFingerprint,
        value: &CacheEntry,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        self.ttl(value)
    }

    fn expire_after_update(
        &self,
        _key: &ImageFingerprint,
        value: &CacheEntry,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.ttl(value)
    }
}

struct GateInner {
    settled: Cache<ImageFingerprint, CacheEntry>,
    in_flight: DashMap<ImageFingerprint, OutcomeRx>,
    store: Option<Arc<dyn VerdictStore>>,
    ready_ttl: Option<Duration>,
    stats: GateStats,
}

/// Shared handle to the gate. Clones are cheap and see the same state.
#[derive(Clone)]
pub struct ResolutionGate {
    inner: Arc<GateInner>,
}

impl std::fmt::Debug for ResolutionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionGate")
            .field("settled", &self.inner.settled.entry_count())
            .field("in_flight", &self.inner.in_flight.len())
            .field("has_store", &self.inner.store.is_some())
            .finish()
    }
}

enum Admission {
    Settled(Outcome),
    Wait(OutcomeRx),
}

/// Removes the in-flight entry when the leader finishes, panics, or is torn down with the
/// runtime. The sender drops after the removal, so a closed channel is never left
/// reachable from the map.
struct InFlightGuard {
    inner: Arc<GateInner>,
    fingerprint: ImageFingerprint,
    tx: watch::Sender<Option<Outcome>>,
}

impl InFlightGuard {
    fn publish(&self, outcome: Outcome) {
        self.tx.send_replace(Some(outcome));
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.remove(&self.fingerprint);
    }
}

impl ResolutionGate {
    pub fn new(config: CacheConfig) -> Self {
        Self::build(config, None)
    }

    /// A gate backed by a durable store.
    pub fn with_store(config: CacheConfig, store: Arc<dyn VerdictStore>) -> Self {
        Self::build(config, Some(store))
    }

    fn build(config: CacheConfig, store: Option<Arc<dyn VerdictStore>>) -> Self {
        let settled = Cache::builder()
            .max_capacity(config.capacity)
            .expire_after(SettledExpiry {
                ready_ttl: config.ready_ttl,
                failed_ttl: config.failed_ttl,
            })
            .build();

        Self {
            inner: Arc::new(GateInner {
                settled,
                in_flight: DashMap::new(),
                store,
                ready_ttl: config.ready_ttl,
                stats: GateStats::default(),
            }),
        }
    }

    /// Current entry for `fingerprint`: `Pending` while a resolution runs, otherwise the
    /// settled entry if one is retained.
    pub fn entry(&self, fingerprint: &ImageFingerprint) -> Option<CacheEntry> {
        if let Some(entry) = self.inner.settled.get(fingerprint) {
            return Some(entry);
        }
        self.inner
            .in_flight
            .contains_key(fingerprint)
            .then(|| CacheEntry::pending(*fingerprint))
    }

    /// Settled outcome without starting any work.
    pub fn lookup(&self, fingerprint: &ImageFingerprint) -> Option<Outcome> {
        self.inner.settled.get(fingerprint).and_then(settled_outcome)
    }

    pub fn is_in_flight(&self, fingerprint: &ImageFingerprint) -> bool {
        self.inner.in_flight.contains_key(fingerprint)
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.len()
    }

    pub fn settled_count(&self) -> u64 {
        self.inner.settled.run_pending_tasks();
        self.inner.settled.entry_count()
    }

    /// Drops a settled entry so the next request resolves again.
    pub fn invalidate(&self, fingerprint: &ImageFingerprint) {
        self.inner.settled.invalidate(fingerprint);
    }

    /// Drops every settled entry. Resolutions in flight are unaffected.
    pub fn invalidate_all(&self) {
        self.inner.settled.invalidate_all();
    }

    pub fn stats(&self) -> GateStatsSnapshot {
        self.inner
            .stats
            .snapshot(self.settled_count(), self.in_flight_count())
    }

    /// Returns the outcome for `fingerprint`, running `work` only if nothing is settled or
    /// in flight for it.
    ///
    /// `work` is invoked at most once, and only by the caller that becomes the leader.
    pub async fn get_or_resolve<F, Fut>(&self, fingerprint: ImageFingerprint, work: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResolveResult<GeoVerdict>> + Send + 'static,
    {
        self.inner.stats.record_request();

        let outcome = match self.admit(fingerprint, work) {
            Admission::Settled(outcome) => outcome,
            Admission::Wait(rx) => wait_for_outcome(rx).await,
        };

        self.inner.stats.record_outcome(outcome.is_ok());
        outcome
    }

    fn admit<F, Fut>(&self, fingerprint: ImageFingerprint, work: F) -> Admission
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResolveResult<GeoVerdict>> + Send + 'static,
    {
        if let Some(outcome) = self.lookup(&fingerprint) {
            self.inner.stats.record_cache_hit();
            debug!(fingerprint = %fingerprint.short(), "Verdict cache hit");
            return Admission::Settled(outcome);
        }

        match self.inner.in_flight.entry(fingerprint) {
            Entry::Occupied(entry) => {
                self.inner.stats.record_coalesced();
                debug!(fingerprint = %fingerprint.short(), "Joining in-flight resolution");
                Admission::Wait(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                // A leader may have published and left between the lookup above and
                // taking the entry lock.
                if let Some(outcome) = self.lookup(&fingerprint) {
                    self.inner.stats.record_cache_hit();
                    return Admission::Settled(outcome);
                }

                let (tx, rx) = watch::channel(None);
                entry.insert(rx.clone());

                let guard = InFlightGuard {
                    inner: Arc::clone(&self.inner),
                    fingerprint,
                    tx,
                };
                match std::panic::catch_unwind(AssertUnwindSafe(work)) {
                    Ok(work) => {
                        tokio::spawn(lead(guard, work).instrument(Span::current()));
                    }
                    Err(_) => {
                        error!(fingerprint = %fingerprint.short(), "Resolution panicked on start");
                        guard.publish(Err(ResolveError::Aborted {
                            reason: "resolution panicked".into(),
                        }));
                    }
                }
                Admission::Wait(rx)
            }
        }
    }
}

fn settled_outcome(entry: CacheEntry) -> Option<Outcome> {
    match entry.state {
        EntryState::Ready { verdict } => Some(Ok(verdict)),
        // Only definitive failures are ever settled.
        EntryState::Failed { .. } => Some(Err(ResolveError::NoSignalAvailable)),
        EntryState::Pending => None,
    }
}

async fn wait_for_outcome(mut rx: OutcomeRx) -> Outcome {
    let aborted = || ResolveError::Aborted {
        reason: "resolution ended without publishing an outcome".into(),
    };

    match rx.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone().unwrap_or_else(|| Err(aborted())),
        Err(_) => Err(aborted()),
    }
}

/// Body of the leader task for one fingerprint.
async fn lead<Fut>(guard: InFlightGuard, work: Fut)
where
    Fut: Future<Output = ResolveResult<GeoVerdict>> + Send + 'static,
{
    let inner = Arc::clone(&guard.inner);
    let fingerprint = guard.fingerprint;
    let short = fingerprint.short();

    if let Some(verdict) = load_from_store(&inner, &fingerprint).await {
        inner.stats.record_store_hit();
        inner
            .settled
            .insert(fingerprint, CacheEntry::ready(Arc::clone(&verdict)));
        guard.publish(Ok(verdict));
        debug!(fingerprint = %short, "Verdict restored from store");
        return;
    }

    let start = Instant::now();
    let outcome = match AssertUnwindSafe(work).catch_unwind().await {
        Ok(result) => result.map(Arc::new),
        Err(_) => {
            error!(fingerprint = %short, "Resolution panicked");
            Err(ResolveError::Aborted {
                reason: "resolution panicked".into(),
            })
        }
    };
    inner.stats.record_resolution(start.elapsed());

    let settled = match &outcome {
        Ok(verdict) => Some(CacheEntry::ready(Arc::clone(verdict))),
        Err(e) if e.is_definitive() => Some(CacheEntry::failed(fingerprint, e.to_string())),
        Err(_) => None,
    };
    if let Some(entry) = &settled {
        inner.settled.insert(fingerprint, entry.clone());
    }

    guard.publish(outcome);
    drop(guard);

    if let (Some(store), Some(entry)) = (&inner.store, settled.filter(CacheEntry::is_ready)) {
        if let Err(e) = store.put(&fingerprint, &entry).await {
            warn!(fingerprint = %short, error = %e, "Failed to persist verdict");
        }
    }
}

async fn load_from_store(
    inner: &GateInner,
    fingerprint: &ImageFingerprint,
) -> Option<Arc<GeoVerdict>> {
    let store = inner.store.as_ref()?;
    match store.get(fingerprint).await {
        Ok(Some(entry)) => {
            let age = (Utc::now() - entry.created_at).to_std().unwrap_or_default();
            if inner.ready_ttl.is_some_and(|ttl| age >= ttl) {
                debug!(fingerprint = %fingerprint.short(), "Stored verdict outlived its TTL");
                return None;
            }
            match entry.state {
                EntryState::Ready { verdict } if verdict.fingerprint == *fingerprint => {
                    Some(verdict)
                }
                _ => None,
            }
        }
        Ok(None) => None,
        Err(e) => {
            warn!(fingerprint = %fingerprint.short(), error = %e, "Verdict store lookup failed");
            None
        }
    }
}
