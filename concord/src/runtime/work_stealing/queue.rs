use crate::runtime::task::Runnable;

use parking_lot::Mutex;

use std::collections::VecDeque;
use std::sync::Arc;

/// A per-worker local task queue.
///
/// The owning worker pushes to the back and pops from the front, so
/// tasks spawned by one worker run in the order they were spawned.
/// Other workers steal from the back, taking the most recently spawned
/// task and leaving the oldest ones to the owner.
pub(crate) struct LocalQueue {
    inner: Mutex<VecDeque<Arc<dyn Runnable>>>,
}

impl LocalQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        self.inner.lock().push_back(task);
    }

    /// Pops the oldest task for the owning worker.
    pub(crate) fn pop(&self) -> Option<Arc<dyn Runnable>> {
        self.inner.lock().pop_front()
    }

    /// Steals the newest task on behalf of another worker.
    pub(crate) fn steal(&self) -> Option<Arc<dyn Runnable>> {
        self.inner.lock().pop_back()
    }
}
