use crate::error::Interrupt;
use crate::runtime::context::current_interrupt;
use crate::runtime::task::interrupt::InterruptCell;
use crate::time::sleep::{Sleep, sleep};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// Bounds `future` by `duration` through an interrupt.
///
/// When the deadline passes, [`Interrupt::TimedOut`] is posted to the
/// current task and the inner future keeps being polled: its next
/// suspension point fails with the interrupt, which lets it unwind on
/// its own terms. A [`Condition`](crate::sync::Condition) wait, for
/// instance, reacquires its lock before returning the timeout.
///
/// The output is the inner future's own. A timeout the inner future never
/// got to observe is withdrawn when it completes, or when this future is
/// dropped.
///
/// # Examples
///
/// ```rust,ignore
/// match timeout_after(Duration::from_millis(50), event.wait()).await {
///     Err(err) if err.interrupt() == Some(Interrupt::TimedOut) => {}
///     other => other?,
/// }
/// ```
pub fn timeout_after<F>(duration: Duration, future: F) -> TimeoutAfter<F>
where
    F: Future,
{
    TimeoutAfter {
        future,
        sleep: sleep(duration),
        posted: None,
        fired: false,
    }
}

/// Future returned by [`timeout_after`].
#[must_use = "futures do nothing unless polled"]
pub struct TimeoutAfter<F> {
    future: F,
    sleep: Sleep,

    /// Cell the timeout was posted to, kept to withdraw it.
    posted: Option<Arc<InterruptCell>>,

    fired: bool,
}

impl<F> TimeoutAfter<F> {
    fn withdraw(&mut self) {
        if let Some(cell) = self.posted.take() {
            if cell.clear(Interrupt::TimedOut) {
                tracing::trace!("unobserved timeout withdrawn");
            }
        }
    }
}

impl<F> Future for TimeoutAfter<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: `future` is never moved out of the pinned struct.
        let this = unsafe { self.get_unchecked_mut() };

        if !this.fired && Pin::new(&mut this.sleep).poll(cx).is_ready() {
            this.fired = true;

            match current_interrupt() {
                Some(cell) => {
                    tracing::trace!("deadline expired; timeout posted");
                    cell.post(Interrupt::TimedOut);
                    this.posted = Some(cell);
                }
                None => tracing::warn!("timeout_after polled outside of a task; timeout dropped"),
            }
        }

        let future = unsafe { Pin::new_unchecked(&mut this.future) };

        match future.poll(cx) {
            Poll::Ready(value) => {
                this.withdraw();
                Poll::Ready(value)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<F> Drop for TimeoutAfter<F> {
    fn drop(&mut self) {
        self.withdraw();
    }
}
