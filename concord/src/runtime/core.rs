use super::blocking::{BlockingHandle, BlockingPool};
use super::config::RuntimeConfig;
use super::context::Handle;
use super::executor::core::Executor;
use super::work_stealing::injector::Injector;
use crate::reactor::command::Command;
use crate::reactor::{Reactor, ReactorHandle};

use std::future::Future;
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

/// The main runtime handle.
///
/// `Runtime` is responsible for:
/// - driving task execution via the executor,
/// - running the timer reactor,
/// - owning the blocking pool used by [`abide`](crate::abide),
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// Dropping the runtime shuts down all internal components.
pub struct Runtime {
    /// Task executor responsible for scheduling and running futures.
    executor: Executor,

    /// Handle to the reactor thread.
    reactor_handle: ReactorHandle,

    reactor_thread: Option<JoinHandle<()>>,

    blocking: BlockingHandle,
}

impl Runtime {
    /// Creates a new runtime from `config`.
    ///
    /// The reactor thread and the executor workers are started
    /// immediately; blocking threads are started on demand.
    ///
    /// # Panics
    ///
    /// Panics if the reactor or a worker thread cannot be spawned.
    pub(crate) fn new(config: RuntimeConfig) -> Self {
        let prefix = config.thread_name_prefix.as_str();

        let (reactor_handle, reactor_thread) =
            Reactor::start(prefix).expect("failed to spawn reactor thread");
        let blocking = BlockingPool::new(config.blocking.clone(), prefix);

        let handle = Handle {
            reactor: reactor_handle.clone(),
            injector: Arc::new(Injector::new()),
            blocking: blocking.clone(),
        };

        let executor = Executor::new(handle, config.worker_threads, prefix);

        tracing::debug!(
            workers = config.worker_threads,
            max_blocking_threads = config.blocking.max_threads,
            "runtime started"
        );

        Self {
            executor,
            reactor_handle,
            reactor_thread: Some(reactor_thread),
            blocking,
        }
    }

    /// Spawns a detached future onto the runtime.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.executor.spawn(future);
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// This method is typically used as the synchronous entry point
    /// of the runtime (e.g. in `main` or tests).
    ///
    /// Internally, the future is spawned onto the executor and its
    /// result is sent back through a channel.
    ///
    /// # Panics
    ///
    /// Panics if the future panics or the runtime shuts down before it
    /// completes.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (transmitter, receiver) = mpsc::channel();

        self.spawn(async move {
            let result = future.await;
            let _ = transmitter.send(result);
        });

        receiver.recv().expect("block_on failed")
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime.
    ///
    /// 1. Signals the executor to shut down and joins its workers
    /// 2. Stops and joins the reactor thread
    /// 3. Shuts the blocking pool down without waiting for busy threads
    fn drop(&mut self) {
        self.executor.shutdown();
        self.executor.join();

        let _ = self.reactor_handle.send(Command::Shutdown);
        if let Some(thread) = self.reactor_thread.take() {
            let _ = thread.join();
        }

        self.blocking.shutdown();

        tracing::debug!("runtime stopped");
    }
}
