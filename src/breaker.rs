//! 熔断器状态机：保护单个 Provider 的调用，失败快速拒绝，冷却后自动探测恢复。
//!
//! The circuit breaker state machine guarding one provider.
//!
//! - **Closed**: normal operation, calls pass through
//! - **Open**: recent failures reached the threshold, calls fail fast
//! - **Half-Open**: cooldown elapsed, a bounded number of probes test recovery

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::CircuitBreakerConfig;
use crate::error::{BreakerError, CircuitOpenError};
use crate::stats::CircuitBreakerSnapshot;
use crate::window::RollingWindow;

/// Lifecycle state of a breaker. Initial state is `Closed`; the machine
/// cycles indefinitely, there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    total_calls: u64,
    successful_calls: u64,
    failed_calls: u64,
    rejected_calls: u64,
    last_failure: Option<Instant>,
    last_failure_at_ms: Option<u64>,
    last_success_at_ms: Option<u64>,
    state_changed_at_ms: u64,
    /// Probes admitted in the current half-open episode.
    half_open_calls: u32,
    window: RollingWindow,
}

impl Inner {
    fn transition(&mut self, to: CircuitState, epoch_ms: u64) {
        self.state = to;
        self.state_changed_at_ms = epoch_ms;
    }
}

/// Circuit breaker wrapping one protected provider.
///
/// All bookkeeping happens under a single mutex held only for bounded
/// critical-section work; the guarded operation itself always executes with
/// the lock released, so a slow call never starves admission checks for
/// concurrent callers of the same provider.
pub struct CircuitBreaker {
    provider: String,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a breaker for `provider` using the system clock.
    pub fn new(provider: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_clock(provider, config, Arc::new(SystemClock))
    }

    /// Create a breaker with an injected time source.
    pub fn with_clock(
        provider: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let epoch_ms = clock.epoch_ms();
        let window = RollingWindow::new(config.rolling_window_size);
        Self {
            provider: provider.into(),
            config,
            clock,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                total_calls: 0,
                successful_calls: 0,
                failed_calls: 0,
                rejected_calls: 0,
                last_failure: None,
                last_failure_at_ms: None,
                last_success_at_ms: None,
                state_changed_at_ms: epoch_ms,
                half_open_calls: 0,
                window,
            }),
        }
    }

    /// Provider name this breaker guards.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The breaker's immutable configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    /// Execute `operation` through the breaker.
    ///
    /// The operation is invoked at most once. If the call is rejected
    /// (circuit open, or probe budget exhausted while half-open) it fails
    /// with [`BreakerError::Open`] and the operation never runs. An admitted
    /// operation's error is recorded and then returned verbatim inside
    /// [`BreakerError::Inner`].
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.admit().await?;

        let started = self.clock.now();
        match operation().await {
            Ok(value) => {
                self.record_success(started).await;
                Ok(value)
            }
            Err(err) => {
                self.record_failure(started).await;
                Err(BreakerError::Inner(err))
            }
        }
    }

    /// Admission check. Counts the call, resolves Open-state cooldown and
    /// half-open probe budgeting, and either clears the call to run or
    /// rejects it.
    async fn admit(&self) -> Result<(), CircuitOpenError> {
        let mut inner = self.inner.lock().await;
        inner.total_calls += 1;
        let now = self.clock.now();

        if inner.state == CircuitState::Open {
            // No failure on record behaves as an already-elapsed cooldown:
            // admit an immediate probe rather than blocking forever.
            let remaining = inner
                .last_failure
                .and_then(|at| self.config.cooldown.checked_sub(now.duration_since(at)))
                .filter(|left| !left.is_zero());

            match remaining {
                None => {
                    inner.transition(CircuitState::HalfOpen, self.clock.epoch_ms());
                    inner.half_open_calls = 0;
                    debug!(provider = %self.provider, "cooldown elapsed, admitting recovery probe");
                }
                Some(left) => {
                    inner.rejected_calls += 1;
                    return Err(CircuitOpenError {
                        provider: self.provider.clone(),
                        cooldown_remaining: left,
                    });
                }
            }
        }

        if inner.state == CircuitState::HalfOpen {
            inner.half_open_calls += 1;
            if inner.half_open_calls > self.config.half_open_max_calls {
                inner.transition(CircuitState::Open, self.clock.epoch_ms());
                // Re-anchor the cooldown so the fresh open period lasts its
                // full length.
                inner.last_failure = Some(now);
                inner.last_failure_at_ms = Some(self.clock.epoch_ms());
                inner.rejected_calls += 1;
                warn!(
                    provider = %self.provider,
                    max_calls = self.config.half_open_max_calls,
                    "probe budget exhausted while half-open, re-opening circuit"
                );
                return Err(CircuitOpenError {
                    provider: self.provider.clone(),
                    cooldown_remaining: self.config.cooldown,
                });
            }
        }

        Ok(())
    }

    async fn record_success(&self, started: Instant) {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now();
        inner.successful_calls += 1;
        inner.last_success_at_ms = Some(self.clock.epoch_ms());
        inner.window.push(true);
        debug!(
            provider = %self.provider,
            elapsed_ms = now.duration_since(started).as_millis() as u64,
            "provider call succeeded"
        );

        if inner.state == CircuitState::HalfOpen
            && inner.window.successes() >= self.config.success_threshold
        {
            inner.transition(CircuitState::Closed, self.clock.epoch_ms());
            inner.half_open_calls = 0;
            info!(provider = %self.provider, "provider recovered, circuit closed");
        }
    }

    async fn record_failure(&self, started: Instant) {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now();
        inner.failed_calls += 1;
        inner.last_failure = Some(now);
        inner.last_failure_at_ms = Some(self.clock.epoch_ms());
        inner.window.push(false);
        debug!(
            provider = %self.provider,
            elapsed_ms = now.duration_since(started).as_millis() as u64,
            "provider call failed"
        );

        // The breaker opens at most once per episode; failures observed while
        // already open only update counters.
        if inner.state != CircuitState::Open
            && inner.window.failures() >= self.config.failure_threshold
        {
            inner.transition(CircuitState::Open, self.clock.epoch_ms());
            warn!(
                provider = %self.provider,
                recent_failures = inner.window.failures(),
                "failure threshold reached, circuit opened"
            );
        }
    }

    /// Consistent snapshot of counters, state, and timestamps.
    pub async fn get_stats(&self) -> CircuitBreakerSnapshot {
        let inner = self.inner.lock().await;
        let now = self.clock.now();

        let open_remaining_ms = match (inner.state, inner.last_failure) {
            (CircuitState::Open, Some(at)) => self
                .config
                .cooldown
                .checked_sub(now.duration_since(at))
                .map(|left| left.as_millis() as u64),
            _ => None,
        };

        let settled = inner.failed_calls + inner.successful_calls;
        let failure_rate = if settled == 0 {
            0.0
        } else {
            inner.failed_calls as f64 / settled as f64
        };

        CircuitBreakerSnapshot {
            provider: self.provider.clone(),
            state: inner.state,
            total_calls: inner.total_calls,
            successful_calls: inner.successful_calls,
            failed_calls: inner.failed_calls,
            rejected_calls: inner.rejected_calls,
            failure_rate,
            last_failure_at_ms: inner.last_failure_at_ms,
            last_success_at_ms: inner.last_success_at_ms,
            state_changed_at_ms: inner.state_changed_at_ms,
            open_remaining_ms,
        }
    }

    /// Force the breaker back to `Closed` and zero all history.
    ///
    /// Administrative recovery; normal operation never calls this.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.total_calls = 0;
        inner.successful_calls = 0;
        inner.failed_calls = 0;
        inner.rejected_calls = 0;
        inner.last_failure = None;
        inner.last_failure_at_ms = None;
        inner.last_success_at_ms = None;
        inner.half_open_calls = 0;
        inner.window.clear();
        inner.transition(CircuitState::Closed, self.clock.epoch_ms());
        info!(provider = %self.provider, "circuit breaker reset");
    }

    /// Test hook: force a state without recording an outcome.
    #[cfg(test)]
    async fn force_state(&self, state: CircuitState) {
        let mut inner = self.inner.lock().await;
        let epoch_ms = self.clock.epoch_ms();
        inner.transition(state, epoch_ms);
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("provider", &self.provider)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
