//! Core runtime components.
//!
//! It is responsible for:
//! - executing asynchronous tasks on a work-stealing executor,
//! - delivering interrupts to suspended tasks,
//! - running blocking work off the executor threads,
//! - enabling cooperative multitasking via yielding.
//!
//! Most users will interact with higher-level APIs built on top of
//! these components rather than using this module directly.

mod core;
mod executor;
mod work_stealing;

pub(crate) mod blocking;
pub(crate) mod builder;
pub(crate) mod config;
pub(crate) mod context;
pub(crate) mod yield_now;

pub mod task;

pub use self::core::Runtime;
