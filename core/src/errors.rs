//! Error types for breaker and health counter operations

use thiserror::Error;

/// Errors raised while constructing a breaker or health counter
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The window must cover between 1 and 60 seconds
    #[error("number_of_seconds_to_store out of bounds ({0}), should be between 1 and 60 seconds")]
    WindowOutOfBounds(i32),
    /// The counter's event loop thread could not be started
    #[error("failed to start health counter loop: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Returned by a health counter whose event loop has already stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("health counter is closed")]
pub struct CounterClosed;

/// Errors returned from [`Breaker::call`](crate::Breaker::call)
#[derive(Debug, Error)]
pub enum CallError<E> {
    /// Circuit is open, the operation was not invoked
    #[error("circuit '{circuit}' is open, call rejected")]
    Open { circuit: String },
    /// The wrapped operation failed
    #[error("{0}")]
    Execution(E),
}

impl<E> CallError<E> {
    /// True when the call was rejected without running the operation
    pub fn is_open(&self) -> bool {
        matches!(self, CallError::Open { .. })
    }

    /// Borrow the operation's own error, if it ran and failed
    pub fn execution(&self) -> Option<&E> {
        match self {
            CallError::Execution(e) => Some(e),
            CallError::Open { .. } => None,
        }
    }

    /// Recover the operation's own error, if it ran and failed
    pub fn into_inner(self) -> Option<E> {
        match self {
            CallError::Execution(e) => Some(e),
            CallError::Open { .. } => None,
        }
    }
}
