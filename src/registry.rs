//! 熔断器注册表：按 Provider 名称惰性创建并复用熔断器实例。
//!
//! Keyed collection of circuit breakers, one per provider name, created
//! lazily on first use and reused for the registry's lifetime.
//!
//! The registry is an explicit object owned by application start-up and
//! passed by reference to whatever issues provider calls — there is no
//! hidden process-wide global. Its lock guards only the provider map and the
//! default config, and is never held while a breaker's own lock is taken for
//! snapshotting.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::debug;

use crate::breaker::CircuitBreaker;
use crate::clock::{Clock, SystemClock};
use crate::config::CircuitBreakerConfig;
use crate::stats::CircuitBreakerSnapshot;

#[derive(Debug)]
struct RegistryInner {
    breakers: HashMap<String, Arc<CircuitBreaker>>,
    default_config: CircuitBreakerConfig,
}

/// Process-wide collection of breakers keyed by provider name.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    clock: Arc<dyn Clock>,
    inner: Mutex<RegistryInner>,
}

impl CircuitBreakerRegistry {
    /// Create an empty registry with the default breaker config.
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create an empty registry with a custom default breaker config.
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a registry whose breakers share an injected time source.
    pub fn with_clock(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: Mutex::new(RegistryInner {
                breakers: HashMap::new(),
                default_config: config,
            }),
        }
    }

    /// Replace the default config applied to breakers created after this
    /// call. Existing breakers are not altered.
    pub async fn set_config(&self, config: CircuitBreakerConfig) {
        self.inner.lock().await.default_config = config;
    }

    /// The config currently applied to newly created breakers.
    pub async fn default_config(&self) -> CircuitBreakerConfig {
        self.inner.lock().await.default_config.clone()
    }

    /// Return the breaker for `provider`, creating it on first use.
    ///
    /// The check-then-insert runs under the registry lock, so at most one
    /// breaker instance is ever created per provider name, even under races.
    pub async fn get_breaker(&self, provider: &str) -> Arc<CircuitBreaker> {
        let mut inner = self.inner.lock().await;
        if let Some(breaker) = inner.breakers.get(provider) {
            return breaker.clone();
        }

        let breaker = Arc::new(CircuitBreaker::with_clock(
            provider,
            inner.default_config.clone(),
            self.clock.clone(),
        ));
        inner.breakers.insert(provider.to_string(), breaker.clone());
        debug!(provider, "created circuit breaker");
        breaker
    }

    /// Snapshot every known provider's stats.
    ///
    /// Per-breaker snapshots are individually consistent; the whole-registry
    /// view is approximate (breakers keep serving calls while others are
    /// being read).
    pub async fn get_all_stats(&self) -> HashMap<String, CircuitBreakerSnapshot> {
        let breakers: Vec<Arc<CircuitBreaker>> = {
            let inner = self.inner.lock().await;
            inner.breakers.values().cloned().collect()
        };

        join_all(breakers.iter().map(|breaker| breaker.get_stats()))
            .await
            .into_iter()
            .map(|snapshot| (snapshot.provider.clone(), snapshot))
            .collect()
    }

    /// Reset every registered breaker.
    ///
    /// Runs under the registry guard so no breaker can be created mid-sweep.
    pub async fn reset_all(&self) {
        let inner = self.inner.lock().await;
        for breaker in inner.breakers.values() {
            breaker.reset().await;
        }
    }

    /// Names of all registered providers.
    pub async fn providers(&self) -> Vec<String> {
        self.inner.lock().await.breakers.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.breakers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
