use crate::error::Interrupt;
use crate::task::Task;
use crate::task::state::COMPLETED;

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::task::{Context, Poll};

/// A handle to a spawned task.
///
/// A `JoinHandle` allows awaiting the result of a task spawned onto
/// the runtime. It implements [`Future`] and resolves once the task
/// has completed.
///
/// Dropping the `JoinHandle` does **not** cancel the task; it only
/// discards the ability to observe its result. Use [`cancel`](Self::cancel)
/// to interrupt it.
pub struct JoinHandle<T> {
    /// Shared reference to the underlying task.
    pub(crate) task: Arc<Task<T>>,
}

impl<T: Send + 'static> JoinHandle<T> {
    /// Requests cancellation of the task.
    ///
    /// [`Interrupt::Cancelled`] is posted to the task and the task is woken.
    /// It is delivered at the task's current or next suspension point,
    /// which then fails with the interrupt. The task keeps running until
    /// its future returns, so await the handle to observe how it unwound.
    pub fn cancel(&self) {
        if self.is_finished() {
            return;
        }

        tracing::debug!("cancellation requested");

        self.task.interrupt.post(Interrupt::Cancelled);
        self.task.clone().wake();
    }

    /// Returns `true` once the task's future has completed.
    pub fn is_finished(&self) -> bool {
        self.task.state.load(Ordering::Acquire) == COMPLETED
    }
}

impl<T> Future for JoinHandle<T> {
    /// The output of the spawned task.
    type Output = T;

    /// Polls the join handle.
    ///
    /// The waker is registered **before** re-checking the task state
    /// to avoid missed wake-ups.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if let Some(value) = self.take_result() {
            return Poll::Ready(value);
        }

        self.task.waiters.lock().push(cx.waker().clone());

        match self.take_result() {
            Some(value) => Poll::Ready(value),
            None => Poll::Pending,
        }
    }
}

impl<T> JoinHandle<T> {
    fn take_result(&self) -> Option<T> {
        if self.task.state.load(Ordering::Acquire) != COMPLETED {
            return None;
        }

        // Safety: COMPLETED is terminal; the worker no longer touches the result.
        let value = unsafe { (*self.task.result.get()).take() };

        Some(value.expect("join handle polled after completion"))
    }
}
