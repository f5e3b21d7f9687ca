use crate::runtime::context::Handle;
use crate::runtime::executor::worker::Worker;
use crate::runtime::task::Task;
use crate::runtime::work_stealing::injector::Injector;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// Multi-threaded task executor.
///
/// The `Executor` is responsible for:
/// - spawning worker threads,
/// - coordinating task execution via work-stealing,
/// - integrating workers with the runtime context,
/// - managing orderly shutdown and thread joining.
///
/// With a single worker it degenerates into a cooperative, single-threaded
/// scheduler.
pub(crate) struct Executor {
    /// Global injector queue shared by all workers.
    injector: Arc<Injector>,

    /// Join handles for worker threads.
    handles: Vec<JoinHandle<()>>,

    /// Shutdown flag shared with all workers.
    shutdown: Arc<AtomicBool>,
}

impl Executor {
    /// Creates a new executor with `threads` workers named
    /// `{prefix}-worker-{id}`.
    ///
    /// The injector must be the one referenced by `handle`.
    pub(crate) fn new(handle: Handle, threads: usize, prefix: &str) -> Self {
        let injector = handle.injector.clone();
        let shutdown = Arc::new(AtomicBool::new(false));

        let locals: Arc<Vec<Arc<LocalQueue>>> =
            Arc::new((0..threads).map(|_| Arc::new(LocalQueue::new())).collect());

        let mut handles = Vec::with_capacity(threads);

        for id in 0..threads {
            let worker = Worker::new(id, locals.clone(), injector.clone());

            let handle = handle.clone();
            let sd = shutdown.clone();

            let thread = thread::Builder::new()
                .name(format!("{prefix}-worker-{id}"))
                .spawn(move || worker.run(sd, handle))
                .expect("failed to spawn executor worker thread");

            handles.push(thread);
        }

        tracing::debug!(workers = threads, "executor started");

        Self {
            injector,
            handles,
            shutdown,
        }
    }

    /// Signals all workers to shut down and wakes the parked ones.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.injector.shutdown();
    }

    /// Spawns a new asynchronous task onto the executor.
    ///
    /// Tasks spawned after shutdown has begun are silently ignored.
    pub(crate) fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.shutdown.load(Ordering::Acquire) {
            return;
        }

        let task = Arc::new(Task::new(future, self.injector.clone()));
        self.injector.push(task);
    }

    /// Waits for all worker threads to terminate.
    ///
    /// This should be called after initiating shutdown.
    pub(crate) fn join(&mut self) {
        for h in self.handles.drain(..) {
            let _ = h.join();
        }
    }
}
