//! # Concord
//!
//! **Concord** is a small cooperative runtime built around task
//! synchronization. It ships a work-stealing executor, a timer reactor and
//! a blocking pool, and on top of them:
//!
//! - **Synchronization primitives** ([`sync`]): [`Event`](sync::Event),
//!   [`Lock`](sync::Lock), [`Semaphore`](sync::Semaphore),
//!   [`BoundedSemaphore`](sync::BoundedSemaphore),
//!   [`Condition`](sync::Condition) and [`Mutex`](sync::Mutex). Waiters are
//!   served in FIFO order and releases hand the resource straight to the
//!   next waiter.
//! - **Interrupts**: a task cancelled through its
//!   [`JoinHandle`](task::JoinHandle), or timed out with
//!   [`timeout_after`](time::timeout_after), sees the interrupt as an error
//!   at its next suspension point and unwinds normally.
//! - **A blocking bridge** ([`abide`]): blocking calls and blocking
//!   enter/exit resources run on the blocking pool while the task stays
//!   suspended.
//! - **Macros**: `#[concord::main]` and `#[concord::test]`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use concord::sync::Event;
//! use concord::task;
//! use std::sync::Arc;
//!
//! #[concord::main]
//! async fn main() {
//!     let event = Arc::new(Event::new());
//!
//!     let waiter = task::spawn({
//!         let event = event.clone();
//!         async move { event.wait().await }
//!     });
//!
//!     event.set();
//!     waiter.await.unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`sync`]: task synchronization primitives
//! - [`abide`]: running blocking code from tasks
//! - [`task`]: spawning, joining and cancelling tasks
//! - [`time`]: sleep and timeouts
//! - [`error`]: error types
//!
//! ## Logging
//!
//! The crate reports through [`tracing`] and never installs a subscriber.

mod reactor;
mod runtime;

pub mod abide;
pub mod error;
pub mod sync;
pub mod time;

pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::config::{BlockingPoolConfig, RuntimeConfig};
pub use runtime::task;
pub use runtime::yield_now::yield_now;

pub use concord_macros::*;
