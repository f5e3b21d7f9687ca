use crate::error::{Interrupt, SyncError};
use crate::runtime::task::interrupt;

use parking_lot::Mutex;

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

/// A task suspended on a [`WaitQueue`].
pub(crate) struct Waiter {
    /// Short tag describing what the task waits for, used in traces.
    reason: &'static str,

    /// Set under the queue lock when the waiter is popped by `resume`.
    resumed: AtomicBool,

    waker: Mutex<Option<Waker>>,
}

impl Waiter {
    fn new(reason: &'static str) -> Self {
        Self {
            reason,
            resumed: AtomicBool::new(false),
            waker: Mutex::new(None),
        }
    }

    pub(crate) fn is_resumed(&self) -> bool {
        self.resumed.load(Ordering::Acquire)
    }

    /// Stores the waker to call on resume, replacing any previous one.
    pub(crate) fn register(&self, waker: &Waker) {
        let mut slot = self.waker.lock();

        match slot.as_ref() {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }

    fn wake(&self) {
        if let Some(waker) = self.waker.lock().take() {
            waker.wake();
        }
    }
}

/// FIFO queue of suspended tasks.
///
/// This is the only suspension mechanism of the primitives in this module:
/// a task enqueues a [`Waiter`] and polls it through a [`Suspend`] until a
/// releasing task pops it with [`resume`](Self::resume).
///
/// Enqueue and resume are always called while the owning primitive's state
/// lock is held, so a waiter's place in the queue and the state it waits
/// for change together.
pub(crate) struct WaitQueue {
    waiters: Mutex<VecDeque<Arc<Waiter>>>,
}

impl WaitQueue {
    pub(crate) const fn new() -> Self {
        Self {
            waiters: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.waiters.lock().is_empty()
    }

    /// Appends a new waiter to the back of the queue.
    pub(crate) fn enqueue(&self, reason: &'static str) -> Arc<Waiter> {
        let waiter = Arc::new(Waiter::new(reason));
        self.waiters.lock().push_back(waiter.clone());

        tracing::trace!(reason, "task suspended");

        waiter
    }

    /// Resumes the first `n` waiters, or all of them if fewer are queued.
    ///
    /// Returns the number of waiters actually resumed.
    pub(crate) fn resume(&self, n: usize) -> usize {
        let resumed: Vec<Arc<Waiter>> = {
            let mut waiters = self.waiters.lock();
            let count = n.min(waiters.len());

            waiters
                .drain(..count)
                .inspect(|waiter| waiter.resumed.store(true, Ordering::Release))
                .collect()
        };

        for waiter in &resumed {
            tracing::trace!(reason = waiter.reason, "task resumed");
            waiter.wake();
        }

        resumed.len()
    }

    /// Removes `waiter` from the queue.
    ///
    /// Returns `false` if it was no longer queued because it had already
    /// been resumed.
    pub(crate) fn remove(&self, waiter: &Arc<Waiter>) -> bool {
        let mut waiters = self.waiters.lock();

        match waiters.iter().position(|w| Arc::ptr_eq(w, waiter)) {
            Some(index) => {
                waiters.remove(index);
                true
            }
            None => false,
        }
    }
}

/// The suspended half of a wait: polls a queued [`Waiter`] until it is
/// resumed or the task is interrupted.
///
/// A resume always wins over an interrupt. When both happen, the
/// interrupt is put back on the task for its next suspension point and
/// the wait succeeds. A shielded wait ignores interrupts entirely.
///
/// Dropping a `Suspend` before it completes removes its waiter from the
/// queue.
pub(crate) struct Suspend<'a> {
    queue: &'a WaitQueue,
    waiter: Option<Arc<Waiter>>,
    shielded: bool,
}

impl<'a> Suspend<'a> {
    pub(crate) fn new(queue: &'a WaitQueue, waiter: Arc<Waiter>) -> Self {
        Self {
            queue,
            waiter: Some(waiter),
            shielded: false,
        }
    }

    pub(crate) fn shielded(queue: &'a WaitQueue, waiter: Arc<Waiter>) -> Self {
        Self {
            queue,
            waiter: Some(waiter),
            shielded: true,
        }
    }

    pub(crate) fn poll_resume(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Interrupt>> {
        let Some(waiter) = self.waiter.as_ref() else {
            return Poll::Ready(Ok(()));
        };

        if waiter.is_resumed() {
            self.waiter = None;
            return Poll::Ready(Ok(()));
        }

        if !self.shielded {
            if let Some(interrupt) = interrupt::take() {
                let removed = self.queue.remove(waiter);
                let reason = waiter.reason;
                self.waiter = None;

                if removed {
                    tracing::trace!(reason, %interrupt, "suspended task interrupted");
                    return Poll::Ready(Err(interrupt));
                }

                interrupt::restore(interrupt);
                return Poll::Ready(Ok(()));
            }
        }

        waiter.register(cx.waker());

        if waiter.is_resumed() {
            self.waiter = None;
            return Poll::Ready(Ok(()));
        }

        Poll::Pending
    }

    /// Gives up the wait.
    ///
    /// Returns `true` if the waiter had already been resumed without the
    /// task observing it, in which case whatever was handed to it must be
    /// passed on.
    pub(crate) fn abandon(&mut self) -> bool {
        match self.waiter.take() {
            Some(waiter) => !self.queue.remove(&waiter),
            None => false,
        }
    }
}

impl Drop for Suspend<'_> {
    fn drop(&mut self) {
        self.abandon();
    }
}

/// A resource a releasing task hands directly to the first waiter.
///
/// Implemented by [`Lock`](super::Lock) and [`Semaphore`](super::Semaphore).
pub(crate) trait HandOff {
    fn queue(&self) -> &WaitQueue;

    /// Takes the resource if it is available; otherwise enqueues a waiter,
    /// atomically with respect to releases.
    fn take_or_enqueue(&self) -> Option<Arc<Waiter>>;

    /// Releases a resource that was handed to a waiter which went away
    /// before observing it.
    fn pass_on(&self);
}

/// Acquisition of a [`HandOff`] resource.
///
/// Resolving successfully means the resource is held, either because it
/// was free or because a release handed it over. Dropping the future
/// after a hand-off it did not observe passes the resource on.
pub(crate) struct Acquire<'a, R: HandOff> {
    resource: &'a R,
    suspend: Option<Suspend<'a>>,
    shielded: bool,
    started: bool,
}

impl<'a, R: HandOff> Acquire<'a, R> {
    pub(crate) fn new(resource: &'a R) -> Self {
        Self {
            resource,
            suspend: None,
            shielded: false,
            started: false,
        }
    }

    /// An acquisition that cannot be interrupted.
    pub(crate) fn shielded(resource: &'a R) -> Self {
        Self {
            resource,
            suspend: None,
            shielded: true,
            started: false,
        }
    }
}

impl<R: HandOff> Future for Acquire<'_, R> {
    type Output = Result<(), SyncError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if !this.started {
            this.started = true;

            let Some(waiter) = this.resource.take_or_enqueue() else {
                return Poll::Ready(Ok(()));
            };

            let queue = this.resource.queue();
            this.suspend = Some(if this.shielded {
                Suspend::shielded(queue, waiter)
            } else {
                Suspend::new(queue, waiter)
            });
        }

        let Some(suspend) = this.suspend.as_mut() else {
            return Poll::Ready(Ok(()));
        };

        match suspend.poll_resume(cx) {
            Poll::Ready(outcome) => {
                this.suspend = None;
                Poll::Ready(outcome.map_err(SyncError::from))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<R: HandOff> Drop for Acquire<'_, R> {
    fn drop(&mut self) {
        if let Some(mut suspend) = self.suspend.take() {
            if suspend.abandon() {
                tracing::debug!("hand-off to a dropped waiter; passing it on");
                self.resource.pass_on();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;
    use std::task::Wake;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting() -> (Arc<CountingWaker>, Waker) {
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());
        (counter, waker)
    }

    #[test]
    fn resume_is_fifo_and_bounded_by_length() {
        let queue = WaitQueue::new();
        let first = queue.enqueue("test");
        let second = queue.enqueue("test");
        let third = queue.enqueue("test");

        assert_eq!(queue.resume(2), 2);
        assert!(first.is_resumed());
        assert!(second.is_resumed());
        assert!(!third.is_resumed());

        assert_eq!(queue.resume(10), 1);
        assert!(third.is_resumed());
        assert!(queue.is_empty());
        assert_eq!(queue.resume(1), 0);
    }

    #[test]
    fn suspend_wakes_on_resume() {
        let queue = WaitQueue::new();
        let (counter, waker) = counting();
        let mut cx = Context::from_waker(&waker);

        let mut suspend = Suspend::new(&queue, queue.enqueue("test"));
        assert!(suspend.poll_resume(&mut cx).is_pending());

        queue.resume(1);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert!(matches!(suspend.poll_resume(&mut cx), Poll::Ready(Ok(()))));
        assert!(!suspend.abandon());
    }

    #[test]
    fn abandon_reports_unobserved_resume() {
        let queue = WaitQueue::new();

        let mut pending = Suspend::new(&queue, queue.enqueue("test"));
        assert!(!pending.abandon());
        assert!(queue.is_empty());

        let mut resumed = Suspend::new(&queue, queue.enqueue("test"));
        queue.resume(1);
        assert!(resumed.abandon());
    }

    #[test]
    fn dropping_suspend_leaves_the_queue() {
        let queue = WaitQueue::new();

        {
            let _suspend = Suspend::new(&queue, queue.enqueue("test"));
            assert_eq!(queue.len(), 1);
        }

        assert_eq!(queue.len(), 0);
    }
}
