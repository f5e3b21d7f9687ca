//! Running blocking code alongside tasks.
//!
//! [`abide`] routes an operation to the right execution path: async code
//! runs directly, blocking code runs on the runtime's blocking pool while
//! the task stays suspended. Blocking resources with an enter/exit shape,
//! such as a thread-level lock, are described by [`BlockingScope`] and
//! adapted by [`ThreadScope`] into a [`CooperativeScope`], the shape the
//! task-level primitives already have.

mod adapter;
mod dispatch;
mod scope;

pub use adapter::{RunInThread, run_in_thread};
pub use dispatch::{Abide, Blocking, Call, Coroutine, Scoped, abide};
pub use scope::{BlockingScope, CooperativeScope, ScopeState, ThreadLock, ThreadScope};
