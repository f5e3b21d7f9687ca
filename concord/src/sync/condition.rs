use super::lock::{Lock, LockGuard};
use super::wait_queue::{Suspend, WaitQueue};
use crate::error::SyncError;

use std::fmt;
use std::future::poll_fn;
use std::sync::Arc;

/// A condition variable bound to a [`Lock`].
///
/// [`wait`](Self::wait) and [`notify`](Self::notify) may only be called
/// while the lock is held. Waiting releases the lock, suspends the task
/// until it is notified, and takes the lock back before returning, even
/// when the wait was interrupted.
///
/// # Examples
///
/// ```rust,ignore
/// let cond = Condition::new();
///
/// cond.acquire().await?;
/// let item = cond.wait_for(|| queue.pop()).await?;
/// cond.release()?;
/// ```
pub struct Condition {
    lock: Arc<Lock>,
    waiters: WaitQueue,
}

impl Condition {
    /// Creates a condition with its own lock.
    pub fn new() -> Self {
        Self::with_lock(Arc::new(Lock::new()))
    }

    /// Creates a condition on a lock shared with other code.
    pub fn with_lock(lock: Arc<Lock>) -> Self {
        Self {
            lock,
            waiters: WaitQueue::new(),
        }
    }

    /// The underlying lock.
    pub fn inner(&self) -> &Arc<Lock> {
        &self.lock
    }

    pub async fn acquire(&self) -> Result<(), SyncError> {
        self.lock.acquire().await
    }

    pub fn release(&self) -> Result<(), SyncError> {
        self.lock.release()
    }

    /// Acquires the underlying lock and returns a guard releasing it on
    /// drop.
    pub async fn lock(&self) -> Result<LockGuard<'_>, SyncError> {
        self.lock.lock().await
    }

    pub fn locked(&self) -> bool {
        self.lock.locked()
    }

    /// Releases the lock and waits to be notified, then reacquires the
    /// lock.
    ///
    /// On return the lock is held again, whatever the outcome. If the
    /// task was interrupted while waiting, the interrupt is returned once
    /// the lock is back.
    ///
    /// # Cancellation
    ///
    /// The lock is only taken back if the future is polled to completion.
    /// Dropping it mid-wait, as [`time::timeout`](crate::time::timeout)
    /// does on expiry, leaves the lock released, so a [`LockGuard`] still
    /// held by the caller would then release a lock that may belong to
    /// another task. Bound a wait with
    /// [`time::timeout_after`](crate::time::timeout_after) instead: it
    /// interrupts the wait, which then reacquires the lock and returns
    /// [`Interrupt::TimedOut`](crate::task::Interrupt::TimedOut).
    pub async fn wait(&self) -> Result<(), SyncError> {
        if !self.lock.locked() {
            return Err(SyncError::WaitUnacquired);
        }

        // Queued before the release so that a notify issued by the next
        // holder cannot be missed.
        let mut suspend = Suspend::new(&self.waiters, self.waiters.enqueue("condition wait"));

        self.lock.release()?;

        let outcome = poll_fn(|cx| suspend.poll_resume(cx)).await;
        drop(suspend);

        self.lock.acquire_shielded().await?;

        outcome.map_err(SyncError::from)
    }

    /// Waits until `predicate` returns `Some`, and returns that value.
    ///
    /// The predicate is evaluated with the lock held, first before any
    /// waiting and then after every wake-up.
    pub async fn wait_for<T, P>(&self, mut predicate: P) -> Result<T, SyncError>
    where
        P: FnMut() -> Option<T>,
    {
        loop {
            if let Some(value) = predicate() {
                return Ok(value);
            }

            self.wait().await?;
        }
    }

    /// Wakes up to `n` waiting tasks.
    ///
    /// The lock stays with the caller; woken tasks take it in turn once it
    /// is released.
    pub fn notify(&self, n: usize) -> Result<(), SyncError> {
        if !self.lock.locked() {
            return Err(SyncError::NotifyUnacquired);
        }

        self.waiters.resume(n);
        Ok(())
    }

    pub fn notify_one(&self) -> Result<(), SyncError> {
        self.notify(1)
    }

    pub fn notify_all(&self) -> Result<(), SyncError> {
        self.notify(self.waiters.len())
    }

    /// Number of tasks suspended in [`wait`](Self::wait).
    pub fn waiters(&self) -> usize {
        self.waiters.len()
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("locked", &self.locked())
            .field("waiters", &self.waiters())
            .finish()
    }
}
