//! Synchronization primitives for tasks.
//!
//! Every primitive here suspends the calling task instead of blocking its
//! thread, and wakes suspended tasks in the order they arrived:
//!
//! - [`Event`]: a resettable latch that wakes every waiter at once,
//! - [`Lock`]: mutual exclusion with direct hand-off to the next waiter,
//! - [`Semaphore`] and [`BoundedSemaphore`]: counting permits,
//! - [`Condition`]: a condition variable bound to a [`Lock`],
//! - [`Mutex`]: a [`Lock`] that owns the data it protects.
//!
//! ## Interrupts
//!
//! A task cancelled through its [`JoinHandle`](crate::task::JoinHandle), or
//! whose [`timeout_after`](crate::time::timeout_after) deadline expires,
//! sees the interrupt at its next suspension point: the waiting call
//! returns [`SyncError::Interrupted`](crate::error::SyncError::Interrupted)
//! and the task leaves the wait queue. If the task was resumed at the same
//! moment, the resume wins and the interrupt is kept for later.
//!
//! Dropping a pending future also leaves the queue; a lock or permit handed
//! to it in the meantime is passed on to the next waiter.

mod condition;
mod event;
mod lock;
mod mutex;
mod semaphore;
mod wait_queue;

pub use condition::Condition;
pub use event::Event;
pub use lock::{Lock, LockGuard};
pub use mutex::{Mutex, MutexGuard};
pub use semaphore::{BoundedSemaphore, Semaphore, SemaphorePermit};
