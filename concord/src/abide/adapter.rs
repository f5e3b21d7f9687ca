use crate::error::AbideError;
use crate::runtime::blocking::CompletionCell;
use crate::runtime::context::current_handle;

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Runs a blocking call on the blocking pool and waits for its result.
///
/// The call is submitted when the returned future is first polled. A
/// panic in `f` is caught and returned as [`AbideError::Panicked`].
///
/// If the task is interrupted while waiting, the future fails with the
/// interrupt; the call itself cannot be stopped and runs to completion
/// with its result discarded.
///
/// # Panics
///
/// The returned future panics if polled outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let contents = run_in_thread(|| std::fs::read_to_string("Cargo.toml")).await?;
/// ```
pub fn run_in_thread<F, T>(f: F) -> RunInThread<F, T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    RunInThread {
        call: Some(f),
        cell: Arc::new(CompletionCell::new()),
    }
}

/// Future returned by [`run_in_thread`].
#[must_use = "futures do nothing unless polled"]
pub struct RunInThread<F, T> {
    call: Option<F>,
    cell: Arc<CompletionCell<Result<T, AbideError>>>,
}

// The call is moved out, never pinned.
impl<F, T> Unpin for RunInThread<F, T> {}

impl<F, T> Future for RunInThread<F, T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    type Output = Result<T, AbideError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(call) = this.call.take() {
            let handle = current_handle().expect("run_in_thread polled outside of a runtime");
            let cell = this.cell.clone();

            let submitted = handle.blocking.spawn(move || {
                let result = catch_unwind(AssertUnwindSafe(call)).map_err(AbideError::from_panic);
                if let Err(err) = cell.resolve(result) {
                    tracing::error!(%err, "blocking call reported twice");
                }
            });

            if let Err(err) = submitted {
                return Poll::Ready(Err(AbideError::Operation(Box::new(err))));
            }
        }

        let mut signaled = true;

        match this.cell.poll_wait(cx, None, &mut signaled) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) => Poll::Ready(Err(err)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<F, T> fmt::Debug for RunInThread<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunInThread")
            .field("submitted", &self.call.is_none())
            .finish_non_exhaustive()
    }
}
