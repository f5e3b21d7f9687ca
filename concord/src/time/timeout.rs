use crate::time::sleep::{Sleep, sleep};

use thiserror::Error;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Error returned by [`timeout`] when the deadline passes first.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("deadline has elapsed")]
pub struct Elapsed(());

/// Bounds `future` by `duration`, dropping it if the deadline passes
/// first.
///
/// # Cancellation
///
/// On expiry the inner future is dropped and never polled again, so it
/// cannot run any code at its suspension point. This is wrong for
/// [`Condition::wait`](crate::sync::Condition::wait): dropped after it
/// released the lock, it never takes it back, and the caller's guard
/// later releases a lock it no longer holds. Futures that must clean up
/// when interrupted, such as a condition wait or a
/// [`ThreadScope`](crate::abide::ThreadScope) entry, should be bounded
/// with [`timeout_after`](super::timeout_after), which interrupts them
/// instead of dropping them.
pub fn timeout<F>(duration: Duration, future: F) -> Timeout<F>
where
    F: Future,
{
    Timeout {
        future,
        sleep: sleep(duration),
    }
}

/// Future returned by [`timeout`].
#[must_use = "futures do nothing unless polled"]
pub struct Timeout<F> {
    future: F,
    sleep: Sleep,
}

impl<F> Future for Timeout<F>
where
    F: Future,
{
    type Output = Result<F::Output, Elapsed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: `future` is never moved out of the pinned struct.
        let this = unsafe { self.get_unchecked_mut() };

        let future = unsafe { Pin::new_unchecked(&mut this.future) };
        if let Poll::Ready(val) = future.poll(cx) {
            return Poll::Ready(Ok(val));
        }

        if Pin::new(&mut this.sleep).poll(cx).is_ready() {
            return Poll::Ready(Err(Elapsed(())));
        }

        Poll::Pending
    }
}
