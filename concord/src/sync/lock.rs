use super::wait_queue::{Acquire, HandOff, WaitQueue, Waiter};
use crate::error::SyncError;

use parking_lot::Mutex;

use std::fmt;
use std::sync::Arc;

/// A FIFO mutual exclusion lock for tasks.
///
/// A task that finds the lock held is suspended. Releasing the lock
/// hands it straight to the longest-waiting task: the lock never becomes
/// free in between, so no other task can slip in ahead of the queue.
///
/// The lock does not know who holds it. Any task may release it, and
/// releasing a free lock is reported as [`SyncError::NotAcquired`].
///
/// # Examples
///
/// ```rust,ignore
/// let lock = Lock::new();
///
/// {
///     let _guard = lock.lock().await?;
///     // exclusive section
/// }
///
/// lock.acquire().await?;
/// lock.release()?;
/// ```
pub struct Lock {
    held: Mutex<bool>,
    waiters: WaitQueue,
}

impl Lock {
    /// Creates an unlocked lock.
    pub const fn new() -> Self {
        Self {
            held: Mutex::new(false),
            waiters: WaitQueue::new(),
        }
    }

    /// Acquires the lock, suspending the task while another holds it.
    ///
    /// Fails only with [`SyncError::Interrupted`] when the task is
    /// cancelled or times out while suspended; the lock is then not held.
    pub async fn acquire(&self) -> Result<(), SyncError> {
        Acquire::new(self).await
    }

    /// Acquires the lock without observing interrupts.
    pub(crate) async fn acquire_shielded(&self) -> Result<(), SyncError> {
        Acquire::shielded(self).await
    }

    /// Releases the lock, handing it to the first waiter if there is one.
    pub fn release(&self) -> Result<(), SyncError> {
        let mut held = self.held.lock();

        if !*held {
            return Err(SyncError::NotAcquired);
        }

        if self.waiters.resume(1) == 0 {
            *held = false;
        } else {
            tracing::debug!("lock handed off");
        }

        Ok(())
    }

    /// Acquires the lock and returns a guard releasing it on drop.
    pub async fn lock(&self) -> Result<LockGuard<'_>, SyncError> {
        self.acquire().await?;
        Ok(LockGuard { lock: self })
    }

    /// Returns `true` if the lock is held.
    pub fn locked(&self) -> bool {
        *self.held.lock()
    }

    /// Number of tasks suspended in [`acquire`](Self::acquire).
    pub fn waiters(&self) -> usize {
        self.waiters.len()
    }
}

impl HandOff for Lock {
    fn queue(&self) -> &WaitQueue {
        &self.waiters
    }

    fn take_or_enqueue(&self) -> Option<Arc<Waiter>> {
        let mut held = self.held.lock();

        if *held {
            return Some(self.waiters.enqueue("lock acquire"));
        }

        *held = true;
        None
    }

    fn pass_on(&self) {
        if let Err(err) = self.release() {
            tracing::error!(%err, "lock handed to a dropped waiter could not be passed on");
        }
    }
}

impl Default for Lock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock")
            .field("locked", &self.locked())
            .field("waiters", &self.waiters())
            .finish()
    }
}

/// Scoped ownership of a [`Lock`], released when dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    lock: &'a Lock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.release() {
            tracing::error!(%err, "lock guard found its lock already released");
        }
    }
}

impl fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").field("lock", self.lock).finish()
    }
}
