//! Asynchronous task primitives.
//!
//! This module defines the core abstractions used by the runtime to
//! represent, schedule, and execute asynchronous tasks:
//! - task state management,
//! - waker integration,
//! - join handles for awaiting and cancelling tasks,
//! - per-task interrupt delivery (cancellation and timeouts).
//!
//! Most users will interact with this module through [`spawn`],
//! [`JoinHandle`] and [`JoinHandle::cancel`]. A cancelled task is not torn
//! down: the cancellation is delivered as [`Interrupt::Cancelled`] at its
//! next suspension point and the task decides how to unwind.

pub(crate) mod handle;
pub(crate) mod interrupt;
pub(crate) mod state;
pub(crate) mod waker;

pub(crate) use self::core::{Runnable, Task};

pub(crate) mod core;

pub use crate::error::Interrupt;
pub use self::core::spawn;
pub use handle::JoinHandle;
pub use interrupt::is_interrupt_pending;
