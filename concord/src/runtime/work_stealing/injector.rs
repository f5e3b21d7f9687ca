use crate::runtime::task::Runnable;

use parking_lot::{Condvar, Mutex};

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Shared handle to the global task injector.
pub(crate) type InjectorHandle = Arc<Injector>;

/// Upper bound on how long an idle worker sleeps before re-checking
/// the local queues of its siblings.
const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// Global task injector for the work-stealing scheduler.
///
/// Tasks spawned from outside a worker, and every task rescheduled by a
/// waker, go through the injector. It also coordinates worker parking:
/// idle workers sleep on its condition variable until a push arrives.
pub(crate) struct Injector {
    /// Queue holding globally injected tasks.
    queue: Mutex<VecDeque<Arc<dyn Runnable>>>,

    /// Number of parked worker threads.
    parked: Mutex<usize>,

    /// Condition variable used to wake parked workers.
    condvar: Condvar,

    /// Indicates whether the executor is shutting down.
    shutdown: AtomicBool,
}

impl Injector {
    pub(crate) fn new() -> Self {
        Injector {
            queue: Mutex::new(VecDeque::new()),
            parked: Mutex::new(0),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Signals shutdown and wakes all parked workers.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        let _parked = self.parked.lock();
        self.condvar.notify_all();
    }

    /// Pushes a task into the global injector and wakes one parked worker.
    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        self.queue.lock().push_back(task);

        let parked = self.parked.lock();
        if *parked > 0 {
            self.condvar.notify_one();
        }
    }

    /// Parks the current worker thread until work becomes available,
    /// shutdown is signalled, or [`PARK_TIMEOUT`] elapses.
    ///
    /// The timeout bounds the delay before a parked worker notices work
    /// sitting in a sibling's local queue.
    pub(crate) fn park(&self) {
        let mut parked = self.parked.lock();

        if self.shutdown.load(Ordering::Acquire) || !self.queue.lock().is_empty() {
            return;
        }

        *parked += 1;
        let _ = self.condvar.wait_for(&mut parked, PARK_TIMEOUT);
        *parked -= 1;
    }

    /// Takes the oldest task from the global injector.
    pub(crate) fn steal(&self) -> Option<Arc<dyn Runnable>> {
        self.queue.lock().pop_front()
    }
}
