use super::wait_queue::{Acquire, HandOff, WaitQueue, Waiter};
use crate::error::SyncError;

use parking_lot::Mutex;

use std::fmt;
use std::sync::Arc;

/// A counting semaphore with FIFO hand-off.
///
/// Acquiring takes a permit, or suspends the task while none is left.
/// Releasing gives the permit straight to the first waiter if there is
/// one, and only returns it to the pool otherwise.
pub struct Semaphore {
    value: Mutex<usize>,
    waiters: WaitQueue,
}

impl Semaphore {
    /// Creates a semaphore holding `permits` permits.
    pub const fn new(permits: usize) -> Self {
        Self {
            value: Mutex::new(permits),
            waiters: WaitQueue::new(),
        }
    }

    /// Takes a permit, suspending the task while none is available.
    pub async fn acquire(&self) -> Result<(), SyncError> {
        Acquire::new(self).await
    }

    /// Returns a permit.
    ///
    /// Always succeeds; the `Result` mirrors [`BoundedSemaphore::release`].
    pub fn release(&self) -> Result<(), SyncError> {
        self.release_inner(None)
    }

    /// Takes a permit and returns a guard giving it back on drop.
    pub async fn permit(&self) -> Result<SemaphorePermit<'_>, SyncError> {
        self.acquire().await?;

        Ok(SemaphorePermit {
            semaphore: self,
            bound: None,
        })
    }

    /// Returns `true` if no permit is available.
    pub fn locked(&self) -> bool {
        *self.value.lock() == 0
    }

    /// Number of permits currently available.
    pub fn value(&self) -> usize {
        *self.value.lock()
    }

    /// Number of tasks suspended in [`acquire`](Self::acquire).
    pub fn waiters(&self) -> usize {
        self.waiters.len()
    }

    /// Returns a permit, refusing to when `bound` permits are already
    /// available. The check comes first, even when tasks are waiting.
    fn release_inner(&self, bound: Option<usize>) -> Result<(), SyncError> {
        let mut value = self.value.lock();

        if bound.is_some_and(|bound| *value >= bound) {
            return Err(SyncError::BoundExceeded);
        }

        if self.waiters.resume(1) == 0 {
            *value += 1;
        } else {
            tracing::debug!("permit handed off");
        }

        Ok(())
    }
}

impl HandOff for Semaphore {
    fn queue(&self) -> &WaitQueue {
        &self.waiters
    }

    fn take_or_enqueue(&self) -> Option<Arc<Waiter>> {
        let mut value = self.value.lock();

        if *value == 0 {
            return Some(self.waiters.enqueue("semaphore acquire"));
        }

        *value -= 1;
        None
    }

    fn pass_on(&self) {
        if let Err(err) = self.release_inner(None) {
            tracing::error!(%err, "permit handed to a dropped waiter could not be passed on");
        }
    }
}

impl Default for Semaphore {
    /// A semaphore with a single permit.
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("value", &self.value())
            .field("waiters", &self.waiters())
            .finish()
    }
}

/// A [`Semaphore`] that refuses to hold more permits than it started
/// with.
///
/// Releasing when the initial number of permits is already available
/// fails with [`SyncError::BoundExceeded`] and leaves the count as is.
pub struct BoundedSemaphore {
    semaphore: Semaphore,
    bound: usize,
}

impl BoundedSemaphore {
    /// Creates a semaphore holding, and bounded by, `permits` permits.
    pub const fn new(permits: usize) -> Self {
        Self {
            semaphore: Semaphore::new(permits),
            bound: permits,
        }
    }

    pub async fn acquire(&self) -> Result<(), SyncError> {
        self.semaphore.acquire().await
    }

    pub fn release(&self) -> Result<(), SyncError> {
        self.semaphore.release_inner(Some(self.bound))
    }

    /// Takes a permit and returns a guard giving it back on drop.
    pub async fn permit(&self) -> Result<SemaphorePermit<'_>, SyncError> {
        self.semaphore.acquire().await?;

        Ok(SemaphorePermit {
            semaphore: &self.semaphore,
            bound: Some(self.bound),
        })
    }

    pub fn locked(&self) -> bool {
        self.semaphore.locked()
    }

    pub fn value(&self) -> usize {
        self.semaphore.value()
    }

    /// The maximum number of permits the semaphore may hold.
    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn waiters(&self) -> usize {
        self.semaphore.waiters()
    }
}

impl Default for BoundedSemaphore {
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Debug for BoundedSemaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedSemaphore")
            .field("value", &self.value())
            .field("bound", &self.bound)
            .field("waiters", &self.waiters())
            .finish()
    }
}

/// A permit taken from a [`Semaphore`] or [`BoundedSemaphore`], returned
/// when dropped.
#[must_use = "the permit is returned as soon as it is dropped"]
pub struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
    bound: Option<usize>,
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.semaphore.release_inner(self.bound) {
            tracing::error!(%err, "semaphore permit could not be returned");
        }
    }
}

impl fmt::Debug for SemaphorePermit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemaphorePermit")
            .field("semaphore", self.semaphore)
            .finish()
    }
}
