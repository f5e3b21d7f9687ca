//! Error types shared by the synchronization primitives and the blocking
//! bridge.
//!
//! Three kinds of outcome are kept apart:
//!
//! - [`Interrupt`]: a task was cancelled or timed out while suspended. This is
//!   a control-flow signal, not a failure of the primitive.
//! - [`SyncError`]: contract violations (releasing an unheld lock, waiting on
//!   an unacquired condition) and the bounded-semaphore range error.
//! - [`AbideError`]: failures crossing the thread boundary of the blocking
//!   adapter, including the underlying operation's own error.

use crate::abide::ScopeState;

use thiserror::Error;

/// Boxed error used to carry a blocking operation's failure across threads.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An interruption delivered to a task at a suspension point.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    /// The task was cancelled through its [`JoinHandle`](crate::task::JoinHandle).
    #[error("task cancelled")]
    Cancelled,

    /// A deadline installed with [`timeout_after`](crate::time::timeout_after)
    /// expired.
    #[error("task timed out")]
    TimedOut,
}

/// Errors reported by the primitives in [`sync`](crate::sync).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// The task was interrupted while suspended.
    #[error(transparent)]
    Interrupted(#[from] Interrupt),

    /// `release` was called on a lock that is not held.
    #[error("lock not acquired")]
    NotAcquired,

    /// `Condition::wait` was called without holding the lock.
    #[error("can't wait on unacquired lock")]
    WaitUnacquired,

    /// `Condition::notify` was called without holding the lock.
    #[error("can't notify on unacquired lock")]
    NotifyUnacquired,

    /// A bounded semaphore was released more times than it was acquired.
    #[error("bounded semaphore released too many times")]
    BoundExceeded,
}

impl SyncError {
    /// Returns the interrupt if this error is one.
    pub fn interrupt(&self) -> Option<Interrupt> {
        match self {
            SyncError::Interrupted(interrupt) => Some(*interrupt),
            _ => None,
        }
    }

    /// Returns `true` for programmer errors: misuse of a lock or condition.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            SyncError::NotAcquired | SyncError::WaitUnacquired | SyncError::NotifyUnacquired
        )
    }

    /// Returns `true` for the bounded-semaphore range error.
    pub fn is_bound_violation(&self) -> bool {
        matches!(self, SyncError::BoundExceeded)
    }
}

/// Errors reported by the blocking bridge in [`abide`](crate::abide).
#[derive(Debug, Error)]
pub enum AbideError {
    /// The awaiting task was interrupted.
    #[error(transparent)]
    Interrupted(#[from] Interrupt),

    /// The blocking operation itself failed.
    #[error("blocking operation failed: {0}")]
    Operation(#[source] BoxError),

    /// The blocking operation panicked on its worker thread.
    #[error("blocking operation panicked: {0}")]
    Panicked(String),

    /// A completion cell was resolved twice.
    #[error("completion cell already resolved")]
    AlreadyResolved,

    /// A completion cell's value was taken twice.
    #[error("completion cell already consumed")]
    Consumed,

    /// A scope adapter was entered or exited out of order.
    #[error("cannot {op} a scope in state {state:?}")]
    InvalidState {
        /// The operation that was attempted.
        op: &'static str,
        /// The state the adapter was in.
        state: ScopeState,
    },
}

impl AbideError {
    /// Returns the interrupt if this error is one.
    pub fn interrupt(&self) -> Option<Interrupt> {
        match self {
            AbideError::Interrupted(interrupt) => Some(*interrupt),
            _ => None,
        }
    }

    /// Returns the underlying operation error, downcast to `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            AbideError::Operation(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Builds a `Panicked` error from a panic payload's message.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        AbideError::Panicked(message)
    }
}
