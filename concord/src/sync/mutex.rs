use super::lock::Lock;
use crate::error::SyncError;

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// An asynchronous mutex protecting a value.
///
/// `Mutex<T>` pairs a [`Lock`] with the data it guards. Tasks that cannot
/// acquire it are suspended rather than blocking their thread, and are
/// served in the order they arrived.
pub struct Mutex<T: ?Sized> {
    lock: Lock,

    /// The underlying data protected by the mutex.
    ///
    /// `UnsafeCell` allows mutable access through shared references,
    /// which is sound because only the holder of `lock` touches it.
    data: UnsafeCell<T>,
}

// Safety: the data is only reachable through a guard, and at most one
// guard exists at a time.
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    /// Creates a new mutex wrapping the given value.
    ///
    /// # Example
    /// ```rust,ignore
    /// let mutex = Mutex::new(42);
    /// ```
    pub const fn new(value: T) -> Mutex<T> {
        Self {
            lock: Lock::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Consumes the mutex, returning the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Acquires the mutex, suspending the task while another task holds
    /// it.
    ///
    /// # Example
    /// ```rust,ignore
    /// let mut guard = mutex.lock().await?;
    /// *guard += 1;
    /// ```
    pub async fn lock(&self) -> Result<MutexGuard<'_, T>, SyncError> {
        self.lock.acquire().await?;
        Ok(MutexGuard { mutex: self })
    }

    /// Returns a mutable reference to the value.
    ///
    /// No locking is needed since the borrow is exclusive.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.locked()
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("locked", &self.lock.locked())
            .field("waiters", &self.lock.waiters())
            .finish_non_exhaustive()
    }
}

/// Guard returned by [`Mutex::lock`].
///
/// Releases the mutex when dropped, handing it to the next waiting task.
#[must_use = "the mutex is released as soon as the guard is dropped"]
pub struct MutexGuard<'a, T: ?Sized> {
    mutex: &'a Mutex<T>,
}

unsafe impl<T: ?Sized + Sync> Sync for MutexGuard<'_, T> {}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        if let Err(err) = self.mutex.lock.release() {
            tracing::error!(%err, "mutex guard found its lock already released");
        }
    }
}

impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: the guard proves the lock is held.
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the guard proves the lock is held and is borrowed mutably.
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for MutexGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
