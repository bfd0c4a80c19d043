use std::time::Duration;
use thiserror::Error;

/// Synthesized rejection: the breaker refused the call without invoking the
/// provider at all.
///
/// Carries enough context for the caller to decide whether to wait out the
/// cooldown, fail fast, or fall back to an alternate provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit open for provider '{provider}', retry in {}ms", .cooldown_remaining.as_millis())]
pub struct CircuitOpenError {
    /// Provider whose breaker rejected the call.
    pub provider: String,
    /// Time left until the next recovery probe is admitted.
    pub cooldown_remaining: Duration,
}

/// Error outcome of a guarded call.
///
/// Either the breaker rejected the call up front, or the call was admitted
/// and the provider operation itself failed — in which case the original
/// error passes through untouched so callers can still branch on it.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// Rejected without attempting the operation.
    #[error(transparent)]
    Open(#[from] CircuitOpenError),

    /// The operation ran and failed; this is its error, verbatim.
    #[error(transparent)]
    Inner(E),
}

impl<E> BreakerError<E> {
    /// True when the call was rejected by the breaker rather than failed
    /// by the provider.
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open(_))
    }

    /// Borrow the rejection details, if this is a rejection.
    pub fn as_open(&self) -> Option<&CircuitOpenError> {
        match self {
            BreakerError::Open(err) => Some(err),
            BreakerError::Inner(_) => None,
        }
    }

    /// Recover the underlying operation error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            BreakerError::Open(_) => None,
            BreakerError::Inner(err) => Some(err),
        }
    }
}
