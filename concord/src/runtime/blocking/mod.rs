//! Bridge between tasks and blocking code.
//!
//! - [`pool`]: the elastic thread pool blocking jobs run on,
//! - [`signal`]: a one-shot flag blocking threads park on,
//! - [`cell`]: a write-once slot carrying a result back to a task.

pub(crate) mod cell;
pub(crate) mod pool;
pub(crate) mod signal;

pub(crate) use cell::CompletionCell;
pub(crate) use pool::{BlockingHandle, BlockingPool};
pub(crate) use signal::Signal;
