use std::time::Duration;

/// Tunable thresholds and timings for one circuit breaker.
///
/// Immutable once a breaker is created; the registry applies its current
/// default config only to breakers created after it was set.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Failures within the rolling window that trip the circuit.
    pub failure_threshold: u32,
    /// Successes required while half-open to close the circuit.
    pub success_threshold: u32,
    /// Cooldown after the last failure before a recovery probe is admitted.
    pub cooldown: Duration,
    /// Probe calls admitted per half-open episode before re-opening.
    pub half_open_max_calls: u32,
    /// Capacity of the rolling outcome window.
    pub rolling_window_size: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            cooldown: Duration::from_secs(60),
            half_open_max_calls: 1,
            rolling_window_size: 100,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure threshold
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the success threshold
    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    /// Set the cooldown duration
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Alias for with_cooldown for API consistency
    pub fn with_reset_timeout(self, timeout: Duration) -> Self {
        self.with_cooldown(timeout)
    }

    /// Set the maximum probe calls per half-open episode
    pub fn with_half_open_max_calls(mut self, max_calls: u32) -> Self {
        self.half_open_max_calls = max_calls;
        self
    }

    /// Set the rolling outcome window capacity
    pub fn with_rolling_window_size(mut self, size: usize) -> Self {
        self.rolling_window_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.success_threshold, 2);
        assert_eq!(config.cooldown, Duration::from_secs(60));
        assert_eq!(config.half_open_max_calls, 1);
        assert_eq!(config.rolling_window_size, 100);
    }

    #[test]
    fn test_config_builder() {
        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(3)
            .with_success_threshold(1)
            .with_cooldown(Duration::from_secs(10))
            .with_half_open_max_calls(2)
            .with_rolling_window_size(20);
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.success_threshold, 1);
        assert_eq!(config.cooldown, Duration::from_secs(10));
        assert_eq!(config.half_open_max_calls, 2);
        assert_eq!(config.rolling_window_size, 20);
    }

    #[test]
    fn test_config_reset_timeout_alias() {
        let config = CircuitBreakerConfig::new().with_reset_timeout(Duration::from_secs(5));
        assert_eq!(config.cooldown, Duration::from_secs(5));
    }
}
