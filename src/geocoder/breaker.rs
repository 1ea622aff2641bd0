//! Circuit breaker state machine.
//!
//! `Closed -> Open -> HalfOpen -> Closed`, driven by explicit timestamps so every
//! transition can be exercised without sleeping.
//!
//! - **Closed**: calls pass. Failures are remembered for `failure_window`; reaching
//!   `failure_threshold` of them opens the circuit.
//! - **Open**: calls are refused until `cooldown` has elapsed.
//! - **HalfOpen**: exactly one probe call passes. Success closes the circuit, failure
//!   re-opens it. A probe that never reports back frees the slot after another `cooldown`.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::{info, warn};

use super::BreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open { until: Instant },
    HalfOpen { probe_started: Instant },
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: BreakerState,
    failures: VecDeque<Instant>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: BreakerState::Closed,
            failures: VecDeque::new(),
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == BreakerState::Closed
    }

    /// Asks permission for one upstream call at `now`.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        match self.state {
            BreakerState::Closed => true,
            BreakerState::Open { until } if now >= until => {
                info!("Circuit half-open; probing upstream");
                self.state = BreakerState::HalfOpen { probe_started: now };
                true
            }
            BreakerState::Open { .. } => false,
            BreakerState::HalfOpen { probe_started }
                if now.duration_since(probe_started) >= self.config.cooldown =>
            {
                self.state = BreakerState::HalfOpen { probe_started: now };
                true
            }
            BreakerState::HalfOpen { .. } => false,
        }
    }

    /// A success reported while `Open` came from a call admitted before the circuit
    /// tripped; it does not shorten the cooldown.
    pub fn record_success(&mut self) {
        match self.state {
            BreakerState::Closed => self.failures.clear(),
            BreakerState::HalfOpen { .. } => {
                info!("Upstream probe succeeded; circuit closed");
                self.state = BreakerState::Closed;
                self.failures.clear();
            }
            BreakerState::Open { .. } => {}
        }
    }

    pub fn record_failure(&mut self, now: Instant) {
        match self.state {
            BreakerState::Closed => {
                self.failures.push_back(now);
                while let Some(&oldest) = self.failures.front() {
                    if now.duration_since(oldest) > self.config.failure_window {
                        self.failures.pop_front();
                    } else {
                        break;
                    }
                }
                if self.failures.len() >= self.config.failure_threshold as usize {
                    warn!(
                        failures = self.failures.len(),
                        cooldown_ms = self.config.cooldown.as_millis() as u64,
                        "Circuit opened"
                    );
                    self.open(now);
                }
            }
            BreakerState::HalfOpen { .. } => {
                warn!("Upstream probe failed; circuit re-opened");
                self.open(now);
            }
            BreakerState::Open { .. } => {}
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = BreakerState::Open {
            until: now + self.config.cooldown,
        };
        self.failures.clear();
    }
}
