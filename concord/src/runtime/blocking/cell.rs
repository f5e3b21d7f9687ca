use crate::error::AbideError;
use crate::runtime::blocking::signal::Signal;
use crate::runtime::task::interrupt;

use parking_lot::Mutex;

use std::pin::Pin;
use std::task::{Context, Poll, Waker};

type Observer<T> = Box<dyn FnOnce(T) + Send + 'static>;

enum CellState<T> {
    Pending {
        waker: Option<Waker>,
        observer: Option<Observer<T>>,
    },
    Ready(T),
    Consumed,
}

/// Write-once slot carrying a result from a blocking thread back to a
/// task.
///
/// The blocking side calls [`resolve`](Self::resolve) exactly once. The
/// task side either takes the value through [`wait`](Self::wait), or
/// hands the cell an observer that receives the value whenever it shows
/// up.
pub(crate) struct CompletionCell<T> {
    state: Mutex<CellState<T>>,
}

impl<T: Send + 'static> CompletionCell<T> {
    pub(crate) const fn new() -> Self {
        Self {
            state: Mutex::new(CellState::Pending {
                waker: None,
                observer: None,
            }),
        }
    }

    /// Stores `value` and wakes the waiting task.
    ///
    /// If an observer is attached, it receives the value instead, on the
    /// calling thread.
    pub(crate) fn resolve(&self, value: T) -> Result<(), AbideError> {
        let mut state = self.state.lock();

        let CellState::Pending { waker, observer } = &mut *state else {
            return Err(AbideError::AlreadyResolved);
        };

        let waker = waker.take();

        match observer.take() {
            Some(observer) => {
                *state = CellState::Consumed;
                drop(state);
                observer(value);
            }
            None => {
                *state = CellState::Ready(value);
                drop(state);
            }
        }

        if let Some(waker) = waker {
            waker.wake();
        }

        Ok(())
    }

    /// Routes the value to `observer` instead of a waiting task.
    ///
    /// Runs `observer` immediately if the value is already there; does
    /// nothing if the value was already taken.
    pub(crate) fn observe(&self, observer: impl FnOnce(T) + Send + 'static) {
        let mut state = self.state.lock();

        if let CellState::Pending { observer: slot, .. } = &mut *state {
            *slot = Some(Box::new(observer));
            return;
        }

        if let CellState::Ready(value) = std::mem::replace(&mut *state, CellState::Consumed) {
            drop(state);
            observer(value);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_resolved(&self) -> bool {
        !matches!(*self.state.lock(), CellState::Pending { .. })
    }

    /// Takes the value if present, otherwise registers `cx`'s waker.
    pub(crate) fn poll_take(&self, cx: &mut Context<'_>) -> Poll<Result<T, AbideError>> {
        let mut state = self.state.lock();

        if let CellState::Pending { waker, .. } = &mut *state {
            match waker {
                Some(existing) if existing.will_wake(cx.waker()) => {}
                _ => *waker = Some(cx.waker().clone()),
            }
            return Poll::Pending;
        }

        match std::mem::replace(&mut *state, CellState::Consumed) {
            CellState::Ready(value) => Poll::Ready(Ok(value)),
            _ => Poll::Ready(Err(AbideError::Consumed)),
        }
    }

    /// Polls for the value, raising `signal` once the waker is in place
    /// and failing with the current task's pending interrupt if the value
    /// is not there yet.
    ///
    /// The signal is raised before the interrupt check so that the
    /// blocking side is never left waiting on a signal nobody will raise.
    pub(crate) fn poll_wait(
        &self,
        cx: &mut Context<'_>,
        signal: Option<&Signal>,
        signaled: &mut bool,
    ) -> Poll<Result<T, AbideError>> {
        if let Poll::Ready(result) = self.poll_take(cx) {
            return Poll::Ready(result);
        }

        if !*signaled {
            *signaled = true;
            if let Some(signal) = signal {
                signal.set();
            }
        }

        match interrupt::take() {
            Some(interrupt) => Poll::Ready(Err(AbideError::Interrupted(interrupt))),
            None => Poll::Pending,
        }
    }

    /// Waits for the value, raising `signal` on first poll.
    pub(crate) fn wait<'a>(&'a self, signal: Option<&'a Signal>) -> FutureWait<'a, T> {
        FutureWait {
            cell: self,
            signal,
            signaled: false,
        }
    }
}

/// Future returned by [`CompletionCell::wait`].
pub(crate) struct FutureWait<'a, T> {
    cell: &'a CompletionCell<T>,
    signal: Option<&'a Signal>,
    signaled: bool,
}

impl<T: Send + 'static> Future for FutureWait<'_, T> {
    type Output = Result<T, AbideError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.cell.poll_wait(cx, this.signal, &mut this.signaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Wake;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn resolving_twice_is_rejected() {
        let cell = CompletionCell::new();

        cell.resolve(1).unwrap();
        assert!(matches!(cell.resolve(2), Err(AbideError::AlreadyResolved)));
    }

    #[test]
    fn value_is_taken_once_and_wakes_the_waiter() {
        let cell = CompletionCell::new();
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());
        let mut cx = Context::from_waker(&waker);

        assert!(cell.poll_take(&mut cx).is_pending());
        assert!(!cell.is_resolved());

        cell.resolve("done").unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert!(cell.is_resolved());

        assert!(matches!(cell.poll_take(&mut cx), Poll::Ready(Ok("done"))));
        assert!(matches!(
            cell.poll_take(&mut cx),
            Poll::Ready(Err(AbideError::Consumed))
        ));
    }

    #[test]
    fn observer_receives_late_and_early_values() {
        let seen = Arc::new(AtomicUsize::new(0));

        let late = CompletionCell::new();
        let s = seen.clone();
        late.observe(move |v: usize| {
            s.fetch_add(v, Ordering::SeqCst);
        });
        late.resolve(2).unwrap();

        let early = CompletionCell::new();
        early.resolve(3).unwrap();
        let s = seen.clone();
        early.observe(move |v: usize| {
            s.fetch_add(v, Ordering::SeqCst);
        });

        assert_eq!(seen.load(Ordering::SeqCst), 5);
        assert!(late.is_resolved());
    }

    #[test]
    fn first_poll_raises_the_signal() {
        let cell = CompletionCell::<u8>::new();
        let signal = Signal::new();
        let waker = Waker::from(Arc::new(CountingWaker(AtomicUsize::new(0))));
        let mut cx = Context::from_waker(&waker);

        let mut wait = cell.wait(Some(&signal));
        assert!(Pin::new(&mut wait).poll(&mut cx).is_pending());
        assert!(signal.is_set());
    }
}
