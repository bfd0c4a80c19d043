//! # provider-guard
//!
//! 这是保护 AI Provider 调用的熔断器子系统，提供快速失败隔离与自动恢复探测。
//!
//! Circuit breaker protection for AI provider calls — fail-fast isolation and
//! automatic recovery probing for LLM inference endpoints, local model
//! runtimes, and any other flaky remote dependency.
//!
//! ## Overview
//!
//! Every call to an external provider runs through a [`CircuitBreaker`]: a
//! small state machine that admits or rejects the call, observes its outcome,
//! and transitions between `Closed`, `Open`, and `HalfOpen`. A
//! [`CircuitBreakerRegistry`] keeps one breaker per provider name, created
//! lazily, so independent providers fail and recover independently.
//!
//! The breaker never retries, queues, or times out the protected operation —
//! it only decides whether the operation may run and records what happened.
//! A rejected call fails immediately with [`CircuitOpenError`]; an admitted
//! call's own error is returned verbatim so callers can still branch on it.
//!
//! ## Key Features
//!
//! - **Fail-fast protection**: recent failures beyond a threshold trip the
//!   circuit; further calls are rejected without touching the provider
//! - **Automatic recovery**: after a cooldown, a bounded number of probe
//!   calls test whether the provider is healthy again
//! - **Rolling outcome window**: thresholds evaluate recent history, distinct
//!   from the lifetime counters exposed in snapshots
//! - **Multi-tenant registry**: one breaker per provider, process-wide, with
//!   a shared default config
//! - **Deterministic tests**: an injectable [`Clock`] lets tests simulate
//!   elapsed cooldowns instead of sleeping
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use provider_guard::{execute_with_breaker, CircuitBreakerConfig, CircuitBreakerRegistry};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = CircuitBreakerRegistry::with_config(
//!         CircuitBreakerConfig::new()
//!             .with_failure_threshold(3)
//!             .with_cooldown(Duration::from_secs(30)),
//!     );
//!
//!     let result = execute_with_breaker(&registry, "openai", || async {
//!         // issue the provider request here
//!         Ok::<_, std::io::Error>("response".to_string())
//!     })
//!     .await;
//!
//!     match result {
//!         Ok(text) => println!("{text}"),
//!         Err(err) if err.is_open() => println!("provider cooling down: {err}"),
//!         Err(err) => println!("provider call failed: {err}"),
//!     }
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`breaker`] | The circuit breaker state machine |
//! | [`registry`] | Provider-keyed breaker registry |
//! | [`facade`] | One-shot `execute_with_breaker` helper |
//! | [`config`] | Thresholds and timings |
//! | [`stats`] | Serializable stats snapshots |
//! | [`error`] | Rejection and pass-through error types |
//! | [`clock`] | Injectable time source |

pub mod breaker;
pub mod clock;
pub mod config;
pub mod error;
pub mod facade;
pub mod registry;
pub mod stats;

mod window;

// Re-export main types for convenience
pub use breaker::{CircuitBreaker, CircuitState};
pub use clock::{Clock, MockClock, SystemClock};
pub use config::CircuitBreakerConfig;
pub use error::{BreakerError, CircuitOpenError};
pub use facade::execute_with_breaker;
pub use registry::CircuitBreakerRegistry;
pub use stats::CircuitBreakerSnapshot;
