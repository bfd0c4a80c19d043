use serde::Serialize;

use crate::breaker::CircuitState;

/// Immutable view of one breaker's counters, state, and timestamps.
///
/// Plain serializable data — suitable for an admin or metrics endpoint owned
/// by the calling layer. Taken as a consistent snapshot under the breaker's
/// guard; timestamps are Unix epoch milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerSnapshot {
    pub provider: String,
    pub state: CircuitState,
    /// Calls seen at admission time, accepted or rejected.
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    /// Calls refused without invoking the provider.
    pub rejected_calls: u64,
    /// failed / (failed + successful); 0.0 before any settled call.
    pub failure_rate: f64,
    pub last_failure_at_ms: Option<u64>,
    pub last_success_at_ms: Option<u64>,
    pub state_changed_at_ms: u64,
    /// Remaining cooldown in ms, if currently open.
    pub open_remaining_ms: Option<u64>,
}
