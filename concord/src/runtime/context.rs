use crate::reactor::ReactorHandle;
use crate::runtime::blocking::BlockingHandle;
use crate::runtime::task::interrupt::InterruptCell;
use crate::runtime::work_stealing::injector::InjectorHandle;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::cell::RefCell;
use std::sync::Arc;

/// Handles to the shared runtime components.
///
/// One `Handle` is installed per thread while it executes runtime work,
/// so that timers, task spawning and the blocking bridge can reach the
/// runtime without explicit parameter passing.
#[derive(Clone)]
pub(crate) struct Handle {
    /// Timer reactor.
    pub(crate) reactor: ReactorHandle,

    /// Global task injector.
    pub(crate) injector: InjectorHandle,

    /// Pool running blocking jobs off the executor threads.
    pub(crate) blocking: BlockingHandle,
}

thread_local! {
    /// Thread-local handle to the current runtime.
    pub(crate) static CURRENT_HANDLE: RefCell<Option<Handle>> =
        const { RefCell::new(None) };

    /// Thread-local identifier of the current worker thread.
    pub(crate) static CURRENT_WORKER_ID: RefCell<Option<usize>> =
        const { RefCell::new(None) };

    /// Thread-local references to all local worker queues.
    ///
    /// This allows work stealing between workers without global
    /// synchronization.
    pub(crate) static CURRENT_LOCALS: RefCell<Option<Arc<Vec<Arc<LocalQueue>>>>> =
        const { RefCell::new(None) };

    /// Interrupt cell of the task currently being polled on this thread.
    pub(crate) static CURRENT_INTERRUPT: RefCell<Option<Arc<InterruptCell>>> =
        const { RefCell::new(None) };
}

/// Enters the runtime execution context for the current thread.
///
/// The handle is installed for the duration of the closure `f`, after
/// which the previous context is restored.
pub(crate) fn enter_context<R>(handle: Handle, f: impl FnOnce() -> R) -> R {
    CURRENT_HANDLE.with(|cell| {
        let prev = cell.replace(Some(handle));

        let out = f();

        cell.replace(prev);

        out
    })
}

/// Runs `f` with `interrupt` installed as the current task's interrupt
/// cell.
pub(crate) fn enter_task<R>(interrupt: Arc<InterruptCell>, f: impl FnOnce() -> R) -> R {
    CURRENT_INTERRUPT.with(|cell| {
        let prev = cell.replace(Some(interrupt));

        let out = f();

        cell.replace(prev);

        out
    })
}

/// Returns a clone of the current runtime handle, if any.
pub(crate) fn current_handle() -> Option<Handle> {
    CURRENT_HANDLE.with(|cell| cell.borrow().clone())
}

/// Returns the interrupt cell of the task being polled, if any.
pub(crate) fn current_interrupt() -> Option<Arc<InterruptCell>> {
    CURRENT_INTERRUPT.with(|cell| cell.borrow().clone())
}
