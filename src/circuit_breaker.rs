//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for outbound calls to
//! the AI provider and OpenFoodFacts. When a service fails repeatedly, the
//! breaker opens and requests fail fast until the reset timeout elapses.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::RecoveryConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

/// Circuit breaker guarding one upstream service
///
/// # State Machine
///
/// - **Closed**: Normal operation, requests pass through
/// - **Open**: Failure threshold reached, requests fail fast
/// - **Reset**: After `circuit_breaker_reset_secs` the counters are cleared
///   and the next request is let through
///
/// # Configuration
///
/// Uses `RecoveryConfig` for:
/// - `circuit_breaker_threshold`: Failures before opening (default: 5)
/// - `circuit_breaker_reset_secs`: Time before attempting reset (default: 60s)
#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    state: Mutex<BreakerState>,
    config: RecoveryConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker for the named service
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fridgechef::config::RecoveryConfig;
    /// use fridgechef::circuit_breaker::CircuitBreaker;
    ///
    /// let circuit_breaker = CircuitBreaker::new("gemini", RecoveryConfig::default());
    /// assert!(!circuit_breaker.is_open());
    /// ```
    pub fn new(name: &'static str, config: RecoveryConfig) -> Self {
        Self {
            name,
            state: Mutex::new(BreakerState::default()),
            config,
        }
    }

    /// Name of the guarded service
    pub fn name(&self) -> &'static str {
        self.name
    }

    // A panic while holding the lock leaves plain counters behind, still usable
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check if the circuit is open (blocking requests)
    ///
    /// Resets to closed once the reset timeout has elapsed since the last failure.
    pub fn is_open(&self) -> bool {
        let mut state = self.lock();

        if state.failure_count >= self.config.circuit_breaker_threshold {
            if let Some(last_time) = state.last_failure_time {
                if last_time.elapsed() < Duration::from_secs(self.config.circuit_breaker_reset_secs)
                {
                    return true;
                }
                info!(service = self.name, "Circuit breaker reset after timeout");
                *state = BreakerState::default();
            }
        }
        false
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());

        if state.failure_count == self.config.circuit_breaker_threshold {
            warn!(
                service = self.name,
                failures = state.failure_count,
                "Circuit breaker opened"
            );
        }
    }

    /// Record a successful call, closing the circuit
    pub fn record_success(&self) {
        *self.lock() = BreakerState::default();
    }

    /// Consecutive failures since the last success or reset
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }
}
