use crate::runtime::context::{CURRENT_LOCALS, CURRENT_WORKER_ID, Handle, enter_context};
use crate::runtime::work_stealing::injector::InjectorHandle;
use crate::runtime::work_stealing::queue::LocalQueue;
use crate::task::Runnable;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A worker thread in the executor.
///
/// The execution order is:
/// 1. Pop from the local queue
/// 2. Take from the global injector
/// 3. Steal from other workers
/// 4. Park if no work is available
pub(crate) struct Worker {
    /// Unique identifier of the worker.
    id: usize,

    /// All local queues (one per worker).
    locals: Arc<Vec<Arc<LocalQueue>>>,

    /// Handle to the global injector queue.
    injector: InjectorHandle,
}

impl Worker {
    pub(crate) fn new(
        id: usize,
        locals: Arc<Vec<Arc<LocalQueue>>>,
        injector: InjectorHandle,
    ) -> Self {
        Self {
            id,
            locals,
            injector,
        }
    }

    /// Runs the worker event loop until shutdown.
    ///
    /// The runtime context is installed for the whole life of the
    /// thread, and the worker's identity and the local queues are
    /// published so that tasks spawned from this thread land in its
    /// local queue.
    pub(crate) fn run(&self, shutdown: Arc<AtomicBool>, handle: Handle) {
        CURRENT_WORKER_ID.with(|id| *id.borrow_mut() = Some(self.id));
        CURRENT_LOCALS.with(|locals| *locals.borrow_mut() = Some(self.locals.clone()));

        enter_context(handle, || {
            loop {
                if shutdown.load(Ordering::Acquire) {
                    break;
                }

                let next = self.locals[self.id]
                    .pop()
                    .or_else(|| self.injector.steal())
                    .or_else(|| self.try_steal());

                match next {
                    Some(task) => task.run(),
                    None => self.injector.park(),
                }
            }
        });

        CURRENT_LOCALS.with(|locals| *locals.borrow_mut() = None);
        tracing::trace!(worker = self.id, "worker stopped");
    }

    /// Attempts to steal a task from another worker's local queue.
    ///
    /// Workers are visited in a round-robin fashion to avoid
    /// starvation and distribute load evenly.
    fn try_steal(&self) -> Option<Arc<dyn Runnable>> {
        let len = self.locals.len();

        if len <= 1 {
            return None;
        }

        (1..len)
            .map(|i| (self.id + i) % len)
            .find_map(|victim| self.locals[victim].steal())
    }
}
