use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that yields execution back to the executor exactly once.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.0 {
            return Poll::Ready(());
        }

        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Yields execution back to the executor.
///
/// The task is rescheduled behind every task already queued, so on a
/// single worker this lets all of them run one step before it continues.
/// Yielding is not a suspension point for interrupts.
///
/// # Examples
///
/// ```rust,ignore
/// async fn task() {
///     // Allow other tasks to run
///     yield_now().await;
/// }
/// ```
pub async fn yield_now() {
    YieldOnce(false).await
}
