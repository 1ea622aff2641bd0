use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{GeocodeError, ReverseGeocoder};

type LookupResult = Result<Option<String>, GeocodeError>;

/// Scripted [`ReverseGeocoder`] that counts invocations.
///
/// Queued responses are returned first, in order; afterwards every call gets the fallback.
#[derive(Debug)]
pub struct MockGeocoder {
    fallback: Mutex<LookupResult>,
    queued: Mutex<VecDeque<LookupResult>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockGeocoder {
    fn with_fallback(fallback: LookupResult) -> Self {
        Self {
            fallback: Mutex::new(fallback),
            queued: Mutex::new(VecDeque::new()),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers `place`.
    pub fn answering(place: impl Into<String>) -> Self {
        Self::with_fallback(Ok(Some(place.into())))
    }

    /// Answers, but knows no place.
    pub fn empty() -> Self {
        Self::with_fallback(Ok(None))
    }

    /// Always fails with `error`.
    pub fn failing(error: GeocodeError) -> Self {
        Self::with_fallback(Err(error))
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    pub fn push_response(&self, response: LookupResult) {
        self.queued.lock().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for MockGeocoder {
    async fn lookup(&self, _latitude: f64, _longitude: f64) -> LookupResult {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.queued.lock().pop_front();
        queued.unwrap_or_else(|| self.fallback.lock().clone())
    }
}
