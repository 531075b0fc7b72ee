//! Count-based circuit breaker.
//!
//! State machine per protected operation:
//!
//! ```text
//! Closed --(failure rate >= threshold over window)--> Open
//! Open   --(wait_duration_in_open elapsed, on next acquire)--> HalfOpen
//! HalfOpen --(probe fails)--> Open
//! HalfOpen --(permitted_calls_in_half_open probes succeed)--> Closed
//! ```
//!
//! Callers obtain a [`CallPermit`] from [`CircuitBreaker::try_acquire`] and
//! report exactly one outcome through it. All transitions happen under one
//! mutex, so outcomes reported by parallel callers are applied one at a time.
//! Each permit remembers the generation it was issued in; an outcome that
//! arrives after the breaker has moved to a different state is ignored.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::telemetry;

/// Circuit breaker configuration.
///
/// ```rust
/// # use huginn::CircuitBreakerConfig;
/// # use std::time::Duration;
/// let config = CircuitBreakerConfig::new()
///     .minimum_number_of_calls(3)
///     .wait_duration_in_open(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Failure ratio (0.0..=1.0) at which the circuit opens. Default: 0.5.
    pub failure_rate_threshold: f64,
    /// Number of most recent outcomes considered. Default: 10.
    pub sliding_window_size: usize,
    /// Outcomes required before the failure rate is evaluated. Default: 5.
    pub minimum_number_of_calls: usize,
    /// Cool-down before a probe is allowed. Default: 30s.
    pub wait_duration_in_open: Duration,
    /// Probes allowed (and successes required) in half-open. Default: 1.
    pub permitted_calls_in_half_open: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            sliding_window_size: 10,
            minimum_number_of_calls: 5,
            wait_duration_in_open: Duration::from_secs(30),
            permitted_calls_in_half_open: 1,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_rate_threshold(mut self, rate: f64) -> Self {
        self.failure_rate_threshold = rate.clamp(0.0, 1.0);
        self
    }

    pub fn sliding_window_size(mut self, size: usize) -> Self {
        self.sliding_window_size = size.max(1);
        self
    }

    pub fn minimum_number_of_calls(mut self, n: usize) -> Self {
        self.minimum_number_of_calls = n.max(1);
        self
    }

    pub fn wait_duration_in_open(mut self, wait: Duration) -> Self {
        self.wait_duration_in_open = wait;
        self
    }

    pub fn permitted_calls_in_half_open(mut self, n: usize) -> Self {
        self.permitted_calls_in_half_open = n.max(1);
        self
    }
}

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls are allowed and their outcomes recorded.
    Closed,
    /// Calls are rejected without reaching the operation.
    Open,
    /// A limited number of probe calls are allowed.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Circuit {
    state: CircuitState,
    last_state_change: Instant,
    generation: u64,
    /// Closed-state outcomes, `true` = failure. Oldest first.
    outcomes: VecDeque<bool>,
    half_open_issued: usize,
    half_open_successes: usize,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            last_state_change: Instant::now(),
            generation: 0,
            outcomes: VecDeque::new(),
            half_open_issued: 0,
            half_open_successes: 0,
        }
    }

    fn failure_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let failures = self.outcomes.iter().filter(|failed| **failed).count();
        failures as f64 / self.outcomes.len() as f64
    }
}

/// A named circuit breaker guarding one protected operation.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            circuit: Mutex::new(Circuit::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state. An open circuit whose cool-down has elapsed still
    /// reports `Open` until the next [`try_acquire`](Self::try_acquire).
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Failure ratio over the current closed-state window.
    pub fn failure_rate(&self) -> f64 {
        self.lock().failure_rate()
    }

    /// Ask to make one call. `None` means the circuit rejected it and the
    /// operation must not be invoked.
    pub fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let mut circuit = self.lock();

        let permitted = match circuit.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if circuit.last_state_change.elapsed() >= self.config.wait_duration_in_open {
                    self.transition_to(&mut circuit, CircuitState::HalfOpen);
                    circuit.half_open_issued += 1;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if circuit.half_open_issued < self.config.permitted_calls_in_half_open {
                    circuit.half_open_issued += 1;
                    true
                } else {
                    false
                }
            }
        };

        if !permitted {
            metrics::counter!(telemetry::CIRCUIT_REJECTIONS_TOTAL, "circuit" => self.name.clone())
                .increment(1);
            return None;
        }

        Some(CallPermit {
            breaker: self,
            generation: circuit.generation,
            half_open: circuit.state == CircuitState::HalfOpen,
            reported: false,
        })
    }

    /// Force the circuit back to closed, discarding recorded outcomes.
    pub fn reset(&self) {
        let mut circuit = self.lock();
        self.transition_to(&mut circuit, CircuitState::Closed);
    }

    /// Force the circuit open, starting a fresh cool-down.
    pub fn force_open(&self) {
        let mut circuit = self.lock();
        self.transition_to(&mut circuit, CircuitState::Open);
    }

    fn lock(&self) -> MutexGuard<'_, Circuit> {
        self.circuit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, generation: u64, failed: bool) {
        let mut circuit = self.lock();
        if circuit.generation != generation {
            return; // outcome from an earlier state
        }

        match circuit.state {
            CircuitState::Closed => {
                circuit.outcomes.push_back(failed);
                while circuit.outcomes.len() > self.config.sliding_window_size {
                    circuit.outcomes.pop_front();
                }
                if circuit.outcomes.len() >= self.config.minimum_number_of_calls
                    && circuit.failure_rate() >= self.config.failure_rate_threshold
                {
                    self.transition_to(&mut circuit, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                if failed {
                    self.transition_to(&mut circuit, CircuitState::Open);
                } else {
                    circuit.half_open_successes += 1;
                    if circuit.half_open_successes >= self.config.permitted_calls_in_half_open {
                        self.transition_to(&mut circuit, CircuitState::Closed);
                    }
                }
            }
            CircuitState::Open => {}
        }
    }

    fn release(&self, generation: u64) {
        let mut circuit = self.lock();
        if circuit.generation == generation && circuit.state == CircuitState::HalfOpen {
            circuit.half_open_issued = circuit.half_open_issued.saturating_sub(1);
        }
    }

    fn transition_to(&self, circuit: &mut Circuit, state: CircuitState) {
        if circuit.state == state {
            return;
        }
        let from = circuit.state;
        let failure_rate = circuit.failure_rate();

        circuit.state = state;
        circuit.last_state_change = Instant::now();
        circuit.generation = circuit.generation.wrapping_add(1);
        circuit.outcomes.clear();
        circuit.half_open_issued = 0;
        circuit.half_open_successes = 0;

        metrics::counter!(
            telemetry::CIRCUIT_TRANSITIONS_TOTAL,
            "circuit" => self.name.clone(),
            "to" => state.as_str()
        )
        .increment(1);

        if state == CircuitState::Open {
            warn!(
                circuit = %self.name,
                from = %from,
                failure_rate,
                wait_secs = self.config.wait_duration_in_open.as_secs(),
                "circuit opened"
            );
        } else {
            info!(circuit = %self.name, from = %from, to = %state, "circuit state changed");
        }
    }
}

/// Permission to make one call through a [`CircuitBreaker`].
///
/// Report the outcome with [`success`](Self::success) or
/// [`failure`](Self::failure). Dropping a permit without reporting records
/// nothing and frees its half-open probe slot.
#[must_use = "report the call outcome with success() or failure()"]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    half_open: bool,
    reported: bool,
}

impl CallPermit<'_> {
    /// Whether this permit is a half-open probe.
    pub fn is_probe(&self) -> bool {
        self.half_open
    }

    pub fn success(mut self) {
        self.reported = true;
        self.breaker.record(self.generation, false);
    }

    pub fn failure(mut self) {
        self.reported = true;
        self.breaker.record(self.generation, true);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.reported && self.half_open {
            self.breaker.release(self.generation);
        }
    }
}
