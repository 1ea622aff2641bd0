use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{VisualModel, VisualModelError, VisualPrediction};

/// Scripted [`VisualModel`] that counts invocations.
#[derive(Debug, Default)]
pub struct MockVisualModel {
    predictions: Mutex<Vec<VisualPrediction>>,
    failure: Mutex<Option<VisualModelError>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockVisualModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_predictions(predictions: Vec<VisualPrediction>) -> Self {
        let mock = Self::new();
        mock.set_predictions(predictions);
        mock
    }

    /// Every call fails with `error`.
    pub fn failing(error: VisualModelError) -> Self {
        let mock = Self::new();
        *mock.failure.lock() = Some(error);
        mock
    }

    /// Sleeps before answering, for timeout and coalescing tests.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    pub fn set_predictions(&self, predictions: Vec<VisualPrediction>) {
        *self.predictions.lock() = predictions;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisualModel for MockVisualModel {
    async fn infer(&self, _image: &[u8]) -> Result<Vec<VisualPrediction>, VisualModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        Ok(self.predictions.lock().clone())
    }
}
