//! Work-stealing scheduler components.
//!
//! - [`injector`]: the global queue fed by spawns from outside a worker
//!   and by every waker, which also parks idle workers,
//! - [`queue`]: per-worker local queues that siblings steal from.

pub(crate) mod injector;
pub(crate) mod queue;
