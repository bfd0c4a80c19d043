//! Convenience entry point: resolve a provider's breaker from a registry and
//! execute one call through it. Carries no state of its own.

use std::future::Future;

use crate::error::BreakerError;
use crate::registry::CircuitBreakerRegistry;

/// Execute `operation` through `provider`'s breaker, creating the breaker on
/// first use with the registry's current default config.
pub async fn execute_with_breaker<F, Fut, T, E>(
    registry: &CircuitBreakerRegistry,
    provider: &str,
    operation: F,
) -> Result<T, BreakerError<E>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let breaker = registry.get_breaker(provider).await;
    breaker.call(operation).await
}
