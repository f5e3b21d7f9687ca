use crate::reactor::command::Command;
use crate::runtime::context::current_handle;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Creates a future that completes after the given duration.
///
/// The returned sleep future registers a timer with the current
/// runtime reactor and completes once the duration has elapsed.
///
/// Sleeping is not a suspension point for interrupts: a pending
/// cancellation or timeout is delivered at the next wait on a
/// synchronization primitive instead.
///
/// # Panics
///
/// Panics if polled outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(duration)
}

/// A future that completes once a specific deadline is reached.
///
/// The timer is registered with the reactor on first poll and cancelled
/// if the future is dropped before completion.
#[must_use = "futures do nothing unless polled"]
pub struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    /// Whether the timer has already been registered with the reactor.
    registered: bool,

    /// Cancellation flag shared with the reactor.
    cancelled: Arc<AtomicBool>,
}

impl Sleep {
    pub(crate) fn new(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
            registered: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        if !this.registered {
            this.registered = true;

            let handle = current_handle().expect("Sleep polled outside of runtime");

            let _ = handle.reactor.send(Command::SetTimer {
                deadline: this.deadline,
                waker: cx.waker().clone(),
                cancelled: this.cancelled.clone(),
            });
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    /// Cancels the timer so that the reactor does not wake the task for
    /// an abandoned sleep.
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}
