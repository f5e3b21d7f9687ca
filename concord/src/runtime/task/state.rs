//! Lifecycle states of a [`Task`](super::Task), stored in an `AtomicUsize`.
//!
//! ```text
//! QUEUED ──run──► RUNNING ──Pending──► IDLE ──wake──► QUEUED
//!                   │  ▲                                 ▲
//!                 wake │                                 │
//!                   ▼  │                                 │
//!                 NOTIFIED ──────── re-queued ───────────┘
//!                   │
//!                 Ready
//!                   ▼
//!               COMPLETED
//! ```

/// Suspended at a pending point; a wake moves it back to `QUEUED`.
pub(crate) const IDLE: usize = 0;

/// Sitting in a run queue.
pub(crate) const QUEUED: usize = 1;

/// Being polled by exactly one worker.
pub(crate) const RUNNING: usize = 2;

/// The future returned `Poll::Ready`; it is never polled again.
pub(crate) const COMPLETED: usize = 3;

/// Woken while `RUNNING`; re-queued as soon as the current poll returns.
pub(crate) const NOTIFIED: usize = 4;
