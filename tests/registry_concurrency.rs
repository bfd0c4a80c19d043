//! Concurrency tests: breaker identity under racing creation, and correct
//! bookkeeping under parallel callers.

use std::sync::Arc;
use std::time::Duration;

use provider_guard::{
    execute_with_breaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState,
};

/// 100 tasks racing get_breaker("x") must all observe the same instance.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_get_breaker_race_yields_one_instance() {
    let registry = Arc::new(CircuitBreakerRegistry::new());

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.get_breaker("x").await })
        })
        .collect();

    let first = registry.get_breaker("x").await;
    for handle in handles {
        let breaker = handle.await.unwrap();
        assert!(Arc::ptr_eq(&first, &breaker));
    }
    assert_eq!(registry.len().await, 1);
}

/// Parallel failing callers: every outcome is recorded, the invariant holds,
/// and the circuit opens exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_failures_trip_once_and_count_fully() {
    let config = CircuitBreakerConfig::new()
        .with_failure_threshold(10)
        .with_cooldown(Duration::from_secs(60));
    let registry = Arc::new(CircuitBreakerRegistry::with_config(config));

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move {
                execute_with_breaker(&registry, "openai", || async {
                    Err::<(), &str>("connection reset")
                })
                .await
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_err());
    }

    let breaker = registry.get_breaker("openai").await;
    assert_eq!(breaker.state().await, CircuitState::Open);

    let stats = breaker.get_stats().await;
    assert_eq!(stats.total_calls, 50);
    assert_eq!(
        stats.total_calls,
        stats.successful_calls + stats.failed_calls + stats.rejected_calls
    );
    // Everything admitted before the trip failed; the rest were rejected
    // without running.
    assert!(stats.failed_calls >= 10);
    assert_eq!(stats.rejected_calls, 50 - stats.failed_calls);
}

/// A slow in-flight call must not block admission checks or snapshots for
/// other callers of the same provider.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_call_does_not_block_bookkeeping() {
    let registry = Arc::new(CircuitBreakerRegistry::new());
    let breaker = registry.get_breaker("ollama").await;

    let (release, gate) = tokio::sync::oneshot::channel::<()>();
    let slow_breaker = breaker.clone();
    let slow = tokio::spawn(async move {
        slow_breaker
            .call(|| async move {
                gate.await.ok();
                Ok::<_, &str>(())
            })
            .await
    });

    // Wait until the slow call has been admitted.
    while breaker.get_stats().await.total_calls < 1 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // While the slow call is in flight, fast calls proceed and stats are
    // readable.
    breaker
        .call(|| async { Ok::<_, &str>(()) })
        .await
        .expect("fast call should pass");
    let stats = breaker.get_stats().await;
    assert!(stats.total_calls >= 2);

    release.send(()).unwrap();
    slow.await.unwrap().expect("slow call should succeed");
    assert_eq!(breaker.get_stats().await.successful_calls, 2);
}

/// Whole-registry snapshot while traffic is flowing on several providers.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_get_all_stats_under_traffic() {
    // Threshold above the injected failure count so no circuit trips and the
    // per-provider tallies stay deterministic.
    let config = CircuitBreakerConfig::new().with_failure_threshold(50);
    let registry = Arc::new(CircuitBreakerRegistry::with_config(config));
    let providers = ["openai", "anthropic", "gemini", "ollama"];

    let handles: Vec<_> = providers
        .into_iter()
        .flat_map(|provider| {
            let registry = registry.clone();
            (0..25).map(move |i| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let _ = execute_with_breaker(&registry, provider, || async move {
                        if i % 5 == 0 {
                            Err("flaky")
                        } else {
                            Ok(())
                        }
                    })
                    .await;
                })
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = registry.get_all_stats().await;
    assert_eq!(stats.len(), providers.len());
    for provider in providers {
        let snapshot = &stats[provider];
        assert_eq!(snapshot.total_calls, 25);
        assert_eq!(snapshot.successful_calls, 20);
        assert_eq!(snapshot.failed_calls, 5);
    }
}

/// reset_all returns every breaker to Closed with zeroed counters.
#[tokio::test]
async fn test_reset_all_sweeps_every_breaker() {
    let config = CircuitBreakerConfig::new()
        .with_failure_threshold(1)
        .with_cooldown(Duration::from_secs(60));
    let registry = CircuitBreakerRegistry::with_config(config);

    for provider in ["openai", "anthropic"] {
        let _ = execute_with_breaker(&registry, provider, || async {
            Err::<(), &str>("down")
        })
        .await;
    }

    registry.reset_all().await;

    for (_, snapshot) in registry.get_all_stats().await {
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.total_calls, 0);
        assert_eq!(snapshot.failed_calls, 0);
    }
}
