use super::wait_queue::{Suspend, WaitQueue};
use crate::error::SyncError;

use parking_lot::Mutex;

use std::fmt;
use std::future::poll_fn;

/// A resettable latch.
///
/// Tasks calling [`wait`](Self::wait) are suspended until another task
/// calls [`set`](Self::set), which wakes all of them at once. Once set,
/// the event lets every `wait` through until it is [`clear`](Self::clear)ed.
pub struct Event {
    signaled: Mutex<bool>,
    waiters: WaitQueue,
}

impl Event {
    pub const fn new() -> Self {
        Self {
            signaled: Mutex::new(false),
            waiters: WaitQueue::new(),
        }
    }

    pub fn is_set(&self) -> bool {
        *self.signaled.lock()
    }

    /// Resets the event. Tasks already woken by `set` are unaffected.
    pub fn clear(&self) {
        *self.signaled.lock() = false;
    }

    /// Waits until the event is set.
    ///
    /// Returns immediately if it already is.
    pub async fn wait(&self) -> Result<(), SyncError> {
        let waiter = {
            let signaled = self.signaled.lock();

            if *signaled {
                return Ok(());
            }

            self.waiters.enqueue("event wait")
        };

        let mut suspend = Suspend::new(&self.waiters, waiter);
        poll_fn(|cx| suspend.poll_resume(cx)).await?;

        Ok(())
    }

    /// Sets the event and wakes every task currently waiting on it.
    pub fn set(&self) {
        let mut signaled = self.signaled.lock();
        *signaled = true;

        let woken = self.waiters.resume(self.waiters.len());
        tracing::trace!(woken, "event set");
    }

    /// Number of tasks suspended in [`wait`](Self::wait).
    pub fn waiters(&self) -> usize {
        self.waiters.len()
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("set", &self.is_set())
            .field("waiters", &self.waiters())
            .finish()
    }
}
